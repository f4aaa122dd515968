//! Rate-limit-aware request execution.
//!
//! `RequestExecutor` wraps one logical API call in a retry loop. Throttled
//! responses wait according to the backoff policy, timeouts wait a short
//! fixed interval, anything else fails straight through. Sleeping goes via
//! the `Sleeper` seam so tests run against a recording fake.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{GradrError, Result};
use crate::throttle::backoff::BackoffPolicy;
use crate::throttle::signal::RateLimitSignal;

/// Fixed wait after a timed-out request.
const TIMEOUT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on a single uninterrupted sleep.
///
/// Server hints can run to many minutes; sleeping in bounded increments lets
/// an interrupt land between chunks instead of inside one long sleep.
const SLEEP_CHUNK: Duration = Duration::from_secs(30);

/// Classification of one failed attempt at an API call.
#[derive(Debug)]
pub enum CallFailure {
    /// HTTP 429 with whatever wait hints the response carried.
    RateLimited(RateLimitSignal),
    /// The request timed out.
    TimedOut,
    /// Any other HTTP error status. Not retried.
    Status { status: u16, message: String },
    /// Transport-level failure (connection, DNS, TLS). Not retried.
    Transport(reqwest::Error),
}

impl std::fmt::Display for CallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallFailure::RateLimited(signal) => write!(f, "rate limited (HTTP {})", signal.status),
            CallFailure::TimedOut => write!(f, "request timed out"),
            CallFailure::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            CallFailure::Transport(source) => write!(f, "transport error: {source}"),
        }
    }
}

/// Result alias for a single API call attempt.
pub type CallResult<T> = std::result::Result<T, CallFailure>;

/// Async sleep seam.
///
/// Production sleeps on the tokio timer; tests substitute a fake that
/// records requested durations and returns immediately.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer, sleeping in bounded chunks.
#[derive(Debug, Default, Clone)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            let chunk = remaining.min(SLEEP_CHUNK);
            tokio::time::sleep(chunk).await;
            remaining = remaining.saturating_sub(chunk);
        }
    }
}

/// Retry loop around a single logical API call.
///
/// Reused for every throttle-prone leg (detail fetch, grade submit); the
/// upstream limiter does not care which endpoint tripped it.
pub struct RequestExecutor<S: Sleeper> {
    policy: BackoffPolicy,
    max_attempts: usize,
    sleeper: Arc<S>,
}

impl<S: Sleeper> RequestExecutor<S> {
    /// Create an executor with the given policy, attempt cap, and sleeper.
    pub fn new(policy: BackoffPolicy, max_attempts: usize, sleeper: Arc<S>) -> Self {
        Self {
            policy,
            max_attempts,
            sleeper,
        }
    }

    /// Execute `call` until it succeeds, fails hard, or the attempt budget
    /// runs out.
    ///
    /// `resource` names the logical operation for logs and terminal errors.
    pub async fn execute<T, F, Fut>(&self, resource: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = CallResult<T>> + Send,
    {
        for attempt in 0..self.max_attempts {
            match call().await {
                Ok(value) => return Ok(value),
                Err(CallFailure::RateLimited(signal)) => {
                    let wait = self.policy.compute_wait(&signal, attempt);
                    tracing::warn!(
                        resource,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        wait_secs = wait.as_secs(),
                        hinted = signal.has_hint(),
                        "rate limited; backing off before retry"
                    );
                    self.sleeper.sleep(wait).await;
                }
                Err(CallFailure::TimedOut) => {
                    tracing::warn!(
                        resource,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        "request timed out; retrying"
                    );
                    self.sleeper.sleep(TIMEOUT_RETRY_DELAY).await;
                }
                Err(CallFailure::Status { status, message }) => {
                    return Err(GradrError::Http {
                        resource: resource.to_string(),
                        status,
                        message,
                    });
                }
                Err(CallFailure::Transport(source)) => {
                    return Err(GradrError::Transport {
                        resource: resource.to_string(),
                        source,
                    });
                }
            }
        }

        tracing::error!(resource, attempts = self.max_attempts, "retries exhausted");
        Err(GradrError::RetriesExhausted {
            resource: resource.to_string(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sleeper that records requested durations and returns immediately.
    #[derive(Debug, Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    fn executor(max_attempts: usize) -> (RequestExecutor<RecordingSleeper>, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        (
            RequestExecutor::new(BackoffPolicy::new(10), max_attempts, sleeper.clone()),
            sleeper,
        )
    }

    fn throttled(body: &str) -> CallFailure {
        CallFailure::RateLimited(RateLimitSignal::from_parts(429, None, body))
    }

    #[tokio::test]
    async fn test_success_returns_immediately() {
        let (executor, sleeper) = executor(3);
        let result: Result<u32> = executor.execute("listing", || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_sleeps_hinted_wait_then_retries() {
        let (executor, sleeper) = executor(3);
        let calls = AtomicUsize::new(0);

        let result: Result<&str> = executor
            .execute("submission detail", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(throttled(r#"{"message":"Try after 2.82 minutes"}"#))
                    } else {
                        Ok("detail")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "detail");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            sleeper.slept.lock().unwrap().as_slice(),
            &[Duration::from_secs(174)]
        );
    }

    #[tokio::test]
    async fn test_timeout_waits_fixed_interval() {
        let (executor, sleeper) = executor(3);
        let calls = AtomicUsize::new(0);

        let result: Result<()> = executor
            .execute("submission detail", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(CallFailure::TimedOut)
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(
            sleeper.slept.lock().unwrap().as_slice(),
            &[Duration::from_secs(5)]
        );
    }

    #[tokio::test]
    async fn test_hard_status_fails_without_retry() {
        let (executor, sleeper) = executor(3);
        let calls = AtomicUsize::new(0);

        let result: Result<()> = executor
            .execute("grade submission", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(CallFailure::Status {
                        status: 403,
                        message: "forbidden".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(GradrError::Http { status: 403, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attempt_cap_produces_terminal_error() {
        let (executor, sleeper) = executor(3);
        let calls = AtomicUsize::new(0);

        let result: Result<()> = executor
            .execute("submission detail", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(throttled("{}")) }
            })
            .await;

        match result {
            Err(GradrError::RetriesExhausted { resource, attempts }) => {
                assert_eq!(resource, "submission detail");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.slept.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unhinted_waits_fall_in_backoff_band() {
        let (executor, sleeper) = executor(3);

        let _: Result<()> = executor
            .execute("submission detail", || async { Err(throttled("{}")) })
            .await;

        let slept = sleeper.slept.lock().unwrap();
        for (attempt, wait) in slept.iter().enumerate() {
            let base = (attempt as u64 + 1) * 10;
            let secs = wait.as_secs();
            assert!(
                (base + 5..=base + 15).contains(&secs),
                "attempt {attempt}: {secs}s outside backoff band"
            );
        }
    }
}
