//! Gradr - automated grading of LMS assignment submissions
//!
//! Lists pending submissions, downloads the attached files, reviews them
//! through an AI review service, and submits marks and feedback back to the
//! LMS. The heart of the crate is the rate-limit-aware request machinery in
//! [`throttle`] that keeps a long batch run alive across throttling stalls.

pub mod config;
pub mod download;
pub mod error;
pub mod lms;
pub mod probe;
pub mod review;
pub mod runner;
pub mod throttle;

pub use error::{GradrError, Result};
