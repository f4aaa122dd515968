//! Inter-request pacing and long countdown waits.
//!
//! Pacing emulates a human working through a queue; the countdown chunks a
//! multi-minute wait into one-minute sleeps so an interrupt lands between
//! chunks and the remaining time stays visible in the logs.

use rand::Rng;
use std::time::Duration;

use crate::throttle::executor::Sleeper;

/// Pick a random delay inside the configured band (fractional seconds).
///
/// A degenerate or inverted band collapses to its minimum.
pub fn pacing_delay(min_secs: f64, max_secs: f64) -> Duration {
    let secs = if max_secs > min_secs {
        rand::rng().random_range(min_secs..=max_secs)
    } else {
        min_secs
    };
    Duration::from_secs_f64(secs.max(0.0))
}

/// Sleep a randomized interval between consecutive submissions.
pub async fn wait_between_requests<S: Sleeper + ?Sized>(sleeper: &S, min_secs: f64, max_secs: f64) {
    let delay = pacing_delay(min_secs, max_secs);
    tracing::info!(delay_secs = delay.as_secs_f64(), "pacing before next submission");
    sleeper.sleep(delay).await;
}

/// Sleep the longer randomized interval after a full batch of submissions.
pub async fn wait_between_batches<S: Sleeper + ?Sized>(sleeper: &S, min_secs: f64, max_secs: f64) {
    let delay = pacing_delay(min_secs, max_secs);
    tracing::info!(delay_secs = delay.as_secs_f64(), "pacing before next batch");
    sleeper.sleep(delay).await;
}

/// Wait `minutes` with a countdown, one minute at a time.
pub async fn wait_with_countdown<S: Sleeper + ?Sized>(sleeper: &S, minutes: u64) {
    tracing::info!(minutes, "waiting for the limiter to clear");
    for remaining in (1..=minutes).rev() {
        tracing::info!(minutes_remaining = remaining, "still waiting");
        sleeper.sleep(Duration::from_secs(60)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

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

    #[test]
    fn test_pacing_delay_stays_in_band() {
        for _ in 0..100 {
            let delay = pacing_delay(2.0, 5.0).as_secs_f64();
            assert!((2.0..=5.0).contains(&delay), "delay {delay} outside band");
        }
    }

    #[test]
    fn test_degenerate_band_collapses_to_minimum() {
        assert_eq!(pacing_delay(3.0, 3.0), Duration::from_secs_f64(3.0));
        assert_eq!(pacing_delay(5.0, 2.0), Duration::from_secs_f64(5.0));
    }

    #[tokio::test]
    async fn test_wait_between_requests_sleeps_once() {
        let sleeper = RecordingSleeper::default();
        wait_between_requests(&sleeper, 1.0, 2.0).await;
        let slept = sleeper.slept.lock().unwrap();
        assert_eq!(slept.len(), 1);
        assert!(slept[0] >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_wait_between_batches_sleeps_once() {
        let sleeper = RecordingSleeper::default();
        wait_between_batches(&sleeper, 5.0, 10.0).await;
        let slept = sleeper.slept.lock().unwrap();
        assert_eq!(slept.len(), 1);
        assert!(slept[0] >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_countdown_sleeps_minute_chunks() {
        let sleeper = RecordingSleeper::default();
        wait_with_countdown(&sleeper, 3).await;
        assert_eq!(
            sleeper.slept.lock().unwrap().as_slice(),
            &[Duration::from_secs(60); 3]
        );
    }

    #[tokio::test]
    async fn test_zero_minute_countdown_does_not_sleep() {
        let sleeper = RecordingSleeper::default();
        wait_with_countdown(&sleeper, 0).await;
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }
}
