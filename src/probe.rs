//! Pre-batch availability check.
//!
//! The listing endpoint alone is an unreliable predictor of throttling; the
//! detail endpoint is the one the limiter actually blocks. The prober makes
//! one cheap listing call and, if anything is pending, one unretried detail
//! fetch for the first item, then reports what it saw. Detection only;
//! recovery belongs to the executor once the batch starts.

use std::sync::Arc;

use crate::lms::client::LmsClient;
use crate::throttle::executor::CallFailure;

/// What a probe learned about the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Both endpoints answered.
    Available,
    /// The LMS is throttling, with whatever wait hint it gave.
    RateLimited { wait_minutes: Option<f64> },
    /// Some other failure; retrying will not help.
    Other(String),
}

impl ProbeOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeOutcome::Available)
    }
}

/// Cheap existence check run before committing to a long batch.
pub struct AvailabilityProber<C: LmsClient> {
    client: Arc<C>,
}

impl<C: LmsClient> AvailabilityProber<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Probe both endpoints once. Never retries.
    pub async fn probe(&self) -> ProbeOutcome {
        let submissions = match self.client.list_submissions(1, 1).await {
            Ok(submissions) => submissions,
            Err(failure) => return Self::classify(failure),
        };

        let Some(first) = submissions.first() else {
            // Nothing pending, nothing left to throttle.
            return ProbeOutcome::Available;
        };

        match self.client.fetch_detail(&first.attempt_id).await {
            Ok(_) => ProbeOutcome::Available,
            Err(failure) => Self::classify(failure),
        }
    }

    fn classify(failure: CallFailure) -> ProbeOutcome {
        match failure {
            CallFailure::RateLimited(signal) => ProbeOutcome::RateLimited {
                wait_minutes: signal.wait_minutes,
            },
            other => ProbeOutcome::Other(other.to_string()),
        }
    }
}
