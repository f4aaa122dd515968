//! Classification of a throttled response.
//!
//! The upstream limiter is undocumented and announces waits in whatever shape
//! it feels like: sometimes a `Retry-After` header, sometimes a JSON body
//! whose free-text message says "Try after 2.82 minutes", sometimes nothing.
//! A `RateLimitSignal` captures everything one failed call revealed so the
//! backoff policy can pick the tightest hint.

use regex::Regex;
use std::sync::LazyLock;

/// How many body characters are kept for diagnostics.
const BODY_EXCERPT_CHARS: usize = 500;

static WAIT_MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)after\s+([\d.]+)\s+minutes?").expect("hardcoded pattern")
});

/// Everything a single throttled response told us about when to come back.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSignal {
    /// HTTP status of the failed call (429 in practice).
    pub status: u16,
    /// Integer seconds from a `Retry-After` header, if one was sent.
    pub retry_after_secs: Option<u64>,
    /// Fractional minutes parsed from the body message, if present.
    pub wait_minutes: Option<f64>,
}

impl RateLimitSignal {
    /// Build a signal from the parts of a throttled response.
    ///
    /// `retry_after` is the raw header value; non-integer values are ignored
    /// the same way the header being absent is.
    pub fn from_parts(status: u16, retry_after: Option<&str>, body: &str) -> Self {
        Self {
            status,
            retry_after_secs: retry_after.and_then(|v| v.trim().parse().ok()),
            wait_minutes: wait_minutes_from_body(body),
        }
    }

    /// Whether the server gave any explicit wait hint at all.
    pub fn has_hint(&self) -> bool {
        self.wait_minutes.is_some() || self.retry_after_secs.is_some()
    }
}

/// Extract a wait duration in minutes from a throttling response body.
///
/// Looks for a JSON `message` field first, then falls back to scanning the
/// raw body, since some deployments return plain text.
fn wait_minutes_from_body(body: &str) -> Option<f64> {
    let haystack = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string());

    WAIT_MINUTES_RE
        .captures(&haystack)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Log the interesting parts of a throttled response before backing off.
///
/// `headers` carries only the rate-limit-relevant headers the caller
/// collected; the body is clipped to an excerpt.
pub fn log_throttle_diagnostics(resource: &str, headers: &[(String, String)], body: &str) {
    let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
    tracing::warn!(
        resource,
        headers = ?headers,
        body = %excerpt,
        "rate limited (429)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_minutes_from_json_message() {
        let signal =
            RateLimitSignal::from_parts(429, None, r#"{"message":"Try after 2.82 minutes"}"#);
        assert_eq!(signal.wait_minutes, Some(2.82));
        assert_eq!(signal.retry_after_secs, None);
        assert_eq!(signal.status, 429);
    }

    #[test]
    fn test_parses_singular_minute() {
        let signal = RateLimitSignal::from_parts(429, None, r#"{"message":"Try after 1 minute"}"#);
        assert_eq!(signal.wait_minutes, Some(1.0));
    }

    #[test]
    fn test_minute_pattern_is_case_insensitive() {
        let signal =
            RateLimitSignal::from_parts(429, None, r#"{"message":"TRY AFTER 3.5 MINUTES"}"#);
        assert_eq!(signal.wait_minutes, Some(3.5));
    }

    #[test]
    fn test_parses_minutes_from_plain_text_body() {
        let signal = RateLimitSignal::from_parts(429, None, "Too many requests, try after 4 minutes");
        assert_eq!(signal.wait_minutes, Some(4.0));
    }

    #[test]
    fn test_parses_retry_after_header() {
        let signal = RateLimitSignal::from_parts(429, Some("120"), "");
        assert_eq!(signal.retry_after_secs, Some(120));
        assert_eq!(signal.wait_minutes, None);
    }

    #[test]
    fn test_ignores_non_integer_retry_after() {
        // HTTP-date form of Retry-After is treated the same as absent
        let signal = RateLimitSignal::from_parts(429, Some("Wed, 21 Oct 2026 07:28:00 GMT"), "");
        assert_eq!(signal.retry_after_secs, None);
    }

    #[test]
    fn test_no_hints() {
        let signal = RateLimitSignal::from_parts(429, None, r#"{"error":"slow down"}"#);
        assert!(!signal.has_hint());
    }

    #[test]
    fn test_both_hints_present() {
        let signal =
            RateLimitSignal::from_parts(429, Some("60"), r#"{"message":"Try after 2 minutes"}"#);
        assert_eq!(signal.retry_after_secs, Some(60));
        assert_eq!(signal.wait_minutes, Some(2.0));
        assert!(signal.has_hint());
    }

    #[test]
    fn test_unrelated_message_yields_no_minutes() {
        let signal = RateLimitSignal::from_parts(429, None, r#"{"message":"quota exceeded"}"#);
        assert_eq!(signal.wait_minutes, None);
    }
}
