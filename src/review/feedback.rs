//! Feedback text shaping.
//!
//! Pure text functions between the review service and the LMS: enforcing
//! the feedback character budget, pulling a numeric score out of the model's
//! text, and converting the narrative into the HTML the LMS rich-text field
//! expects.

use regex::Regex;
use std::sync::LazyLock;

/// Hard budget for feedback sent to the LMS.
pub const MAX_FEEDBACK_CHARS: usize = 800;

/// Narrative budget when the score section must fit inside the total.
const MAX_NARRATIVE_CHARS: usize = 600;

/// Marker separating narrative feedback from the score line.
pub const SCORE_MARKER: &str = "=== SCORE ===";

/// Marker opening the narrative section.
pub const REVIEW_MARKER: &str = "=== REVIEW ===";

static MARKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)MARKS:\s*(\d+)").expect("hardcoded pattern"));

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("hardcoded pattern"));

/// Enforce the feedback budget, truncating at a sentence boundary.
///
/// When the text carries the score marker, the narrative is trimmed first so
/// the score section survives and downstream formatting can still split on
/// the marker.
pub fn truncate_feedback(text: &str) -> String {
    if text.chars().count() <= MAX_FEEDBACK_CHARS {
        return text.to_string();
    }

    if let Some((narrative, score_section)) = text.split_once(SCORE_MARKER) {
        let narrative = truncate_at_sentence(narrative.trim_end(), MAX_NARRATIVE_CHARS);
        let rebuilt = format!("{narrative}\n\n{SCORE_MARKER}{score_section}");
        if rebuilt.chars().count() <= MAX_FEEDBACK_CHARS {
            rebuilt
        } else {
            truncate_at_sentence(&rebuilt, MAX_FEEDBACK_CHARS)
        }
    } else {
        truncate_at_sentence(text, MAX_FEEDBACK_CHARS)
    }
}

fn truncate_at_sentence(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let clipped: String = text.chars().take(limit).collect();
    match clipped.rfind('.') {
        Some(pos) => clipped[..=pos].to_string(),
        None => clipped,
    }
}

/// Extract a score from review text, clamped to `[0, max_score]`.
///
/// Looks for a `MARKS: <n>` line first, then an `<n>/<max>` fraction.
/// Returns `None` when the text carries neither.
pub fn parse_score(text: &str, max_score: u32) -> Option<u32> {
    if let Some(caps) = MARKS_RE.captures(text) {
        return caps
            .get(1)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map(|n| n.min(max_score));
    }

    let fraction = Regex::new(&format!(r"(\d+)\s*/\s*{max_score}")).expect("hardcoded pattern");
    fraction
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|n| n.min(max_score))
}

/// Score used when the review text carries nothing parseable: 70% of the
/// maximum, rounded down.
pub fn default_score(max_score: u32) -> u32 {
    (f64::from(max_score) * 0.7) as u32
}

/// Strip the section scaffolding, keeping only the narrative.
pub fn narrative_only(text: &str) -> String {
    let text = text.split(SCORE_MARKER).next().unwrap_or(text);
    let text = match text.split_once(REVIEW_MARKER) {
        Some((_, rest)) => rest,
        None => text,
    };
    text.trim().to_string()
}

/// Convert a narrative into the HTML the LMS rich-text field expects.
pub fn to_html(narrative: &str) -> String {
    let bolded = BOLD_RE.replace_all(narrative, "<strong>$1</strong>");
    let bulleted = bolded.replace("\n- ", "\n• ");
    let broken = bulleted.replace("\n\n", "<br><br>").replace('\n', "<br>");
    format!(
        "<div style=\"font-family: 'Segoe UI', Arial, sans-serif; line-height: 1.8; color: #333; padding: 15px;\">\n{broken}\n</div>"
    )
}

/// Wrap a short explanatory note (missing file, unsupported format) for the
/// rich-text field.
pub fn plain_note_html(message: &str) -> String {
    format!("<p>{message}</p>")
}
