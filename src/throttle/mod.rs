//! Rate-limit detection, backoff policy, and the retrying request executor.
//!
//! The upstream LMS enforces an undocumented, dynamic rate limit. This
//! module keeps a long batch run alive across throttling stalls: `signal`
//! classifies what a failed response revealed, `backoff` turns that into a
//! wait, and `executor` drives the retry loop.

pub mod backoff;
pub mod executor;
pub mod signal;

pub use backoff::BackoffPolicy;
pub use executor::{CallFailure, CallResult, RequestExecutor, Sleeper, TokioSleeper};
pub use signal::RateLimitSignal;
