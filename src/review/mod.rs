//! AI review adapter boundary.
//!
//! The batch runner talks to the review service through the [`Reviewer`]
//! trait so tests can script outcomes; [`gemini`] provides the production
//! implementation. [`FileKind`] decides up front whether a file can be
//! reviewed at all, distinguishing a real document in the wrong format from
//! an upload that is not a document.

pub mod feedback;
pub mod gemini;

use async_trait::async_trait;
use std::path::Path;

pub use gemini::{GeminiConfig, GeminiReviewer};

/// What a file's extension says about reviewability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Uploadable to the review service as-is.
    Pdf,
    /// A real document the service cannot ingest (.doc, .docx).
    LegacyDocument,
    /// Anything else.
    Unsupported,
}

impl FileKind {
    pub fn classify(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => FileKind::Pdf,
            "doc" | "docx" => FileKind::LegacyDocument,
            _ => FileKind::Unsupported,
        }
    }

    pub fn reviewable(&self) -> bool {
        matches!(self, FileKind::Pdf)
    }
}

/// Result of reviewing one submission file.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// Whether the file was a format the pipeline recognizes at all.
    pub format_valid: bool,
    /// Whether the review service could actually read it.
    pub reviewable: bool,
    /// The model's feedback text, already held to the character budget.
    pub raw_feedback: String,
    /// Extracted score, bounded to the configured maximum.
    pub score: Option<u32>,
    /// How many attempts the adapter made.
    pub retry_count: u32,
    /// The review capability itself is broken; the run must stop.
    pub terminal_failure: bool,
}

impl ReviewOutcome {
    /// A completed review with feedback and a score.
    pub fn reviewed(feedback: impl Into<String>, score: u32, retry_count: u32) -> Self {
        Self {
            format_valid: true,
            reviewable: true,
            raw_feedback: feedback.into(),
            score: Some(score),
            retry_count,
            terminal_failure: false,
        }
    }

    /// The adapter exhausted its attempts; reviewing is broken.
    pub fn broken(error: impl Into<String>, retry_count: u32) -> Self {
        Self {
            format_valid: true,
            reviewable: false,
            raw_feedback: error.into(),
            score: None,
            retry_count,
            terminal_failure: true,
        }
    }
}

/// The review service seam.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Review one file, personalizing feedback with the student's name when
    /// available and bounding the score to `max_score`.
    async fn review(
        &self,
        file: &Path,
        student_name: Option<&str>,
        max_score: u32,
    ) -> ReviewOutcome;
}
