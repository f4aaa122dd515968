//! LMS boundary: wire shapes and the HTTP client.

pub mod client;
pub mod types;

pub use client::{HttpLmsClient, LmsClient};
pub use types::{Exercise, FileDetail, GradePayload, Submission, SubmissionDetail, SubmissionPage};
