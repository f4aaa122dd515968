//! Wait computation for throttled requests.
//!
//! Pure policy, no I/O: given what a failed call revealed and which attempt
//! this was, decide how long to sleep before trying again.

use crate::throttle::signal::RateLimitSignal;
use rand::Rng;
use std::time::Duration;

/// Safety buffer added on top of a server-declared wait time (seconds).
const WAIT_HINT_BUFFER_SECS: u64 = 5;

/// Backoff policy for rate-limited calls.
///
/// Hint priority, first applicable wins:
/// 1. A wait time parsed from the server's message is authoritative:
///    `floor(minutes * 60) + 5` seconds. The buffer is applied after the
///    conversion so a fractional hint never loses it (2.82 min → 169 + 5).
/// 2. An integer `Retry-After` gets 2-5 seconds of jitter so callers that
///    were throttled together do not retry together.
/// 3. Otherwise `(attempt + 1) * base_delay` plus 5-15 seconds of jitter.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Base delay for the no-hint fallback (seconds).
    pub base_delay_secs: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { base_delay_secs: 10 }
    }
}

impl BackoffPolicy {
    /// Create a policy with the given fallback base delay.
    pub fn new(base_delay_secs: u64) -> Self {
        Self { base_delay_secs }
    }

    /// Compute the wait before retry `attempt_index + 1`.
    pub fn compute_wait(&self, signal: &RateLimitSignal, attempt_index: usize) -> Duration {
        let secs = if let Some(minutes) = signal.wait_minutes {
            (minutes * 60.0).floor() as u64 + WAIT_HINT_BUFFER_SECS
        } else if let Some(retry_after) = signal.retry_after_secs {
            retry_after + rand::rng().random_range(2..=5)
        } else {
            (attempt_index as u64 + 1) * self.base_delay_secs + rand::rng().random_range(5..=15)
        };
        Duration::from_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(retry_after: Option<u64>, wait_minutes: Option<f64>) -> RateLimitSignal {
        RateLimitSignal {
            status: 429,
            retry_after_secs: retry_after,
            wait_minutes,
        }
    }

    #[test]
    fn test_message_minutes_are_exact() {
        let policy = BackoffPolicy::default();
        let wait = policy.compute_wait(&signal(None, Some(2.82)), 0);
        // floor(2.82 * 60) = 169, plus the 5s buffer
        assert_eq!(wait, Duration::from_secs(174));
    }

    #[test]
    fn test_whole_minutes_keep_the_buffer() {
        let policy = BackoffPolicy::default();
        let wait = policy.compute_wait(&signal(None, Some(2.0)), 0);
        assert_eq!(wait, Duration::from_secs(125));
    }

    #[test]
    fn test_message_minutes_win_over_retry_after() {
        let policy = BackoffPolicy::default();
        let wait = policy.compute_wait(&signal(Some(600), Some(1.0)), 0);
        assert_eq!(wait, Duration::from_secs(65));
    }

    #[test]
    fn test_retry_after_gets_bounded_jitter() {
        let policy = BackoffPolicy::default();
        for _ in 0..50 {
            let wait = policy.compute_wait(&signal(Some(30), None), 0).as_secs();
            assert!((32..=35).contains(&wait), "wait {wait} outside [32, 35]");
        }
    }

    #[test]
    fn test_fallback_scales_with_attempt() {
        let policy = BackoffPolicy::new(10);
        for attempt in 0..3 {
            for _ in 0..50 {
                let wait = policy.compute_wait(&signal(None, None), attempt).as_secs();
                let base = (attempt as u64 + 1) * 10;
                assert!(
                    (base + 5..=base + 15).contains(&wait),
                    "attempt {attempt}: wait {wait} outside [{}, {}]",
                    base + 5,
                    base + 15
                );
            }
        }
    }

    #[test]
    fn test_fallback_respects_base_delay() {
        let policy = BackoffPolicy::new(60);
        let wait = policy.compute_wait(&signal(None, None), 0).as_secs();
        assert!(wait >= 65);
    }
}
