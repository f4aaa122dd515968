//! Wire shapes for the LMS API.
//!
//! Ids that the LMS round-trips between the detail response and the grade
//! payload stay as raw JSON values; the server is inconsistent about whether
//! they are numbers or strings and we never interpret them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One pending grading task from the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    /// Opaque attempt key, stable across calls.
    pub attempt_id: String,
    /// Student display name.
    #[serde(default = "unknown_student")]
    pub name: String,
    /// Assignment display name.
    #[serde(default = "unknown_assignment")]
    pub assessment_name: String,
}

fn unknown_student() -> String {
    "Unknown".to_string()
}

fn unknown_assignment() -> String {
    "Unknown Assignment".to_string()
}

/// Envelope of the listing endpoint; an empty `submission` array ends paging.
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionPage {
    #[serde(default, rename = "submission")]
    pub submissions: Vec<Submission>,
}

/// Full detail for one submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionDetail {
    pub exercise: Exercise,
}

/// Exercise metadata nested in a submission detail.
#[derive(Debug, Clone, Deserialize)]
pub struct Exercise {
    pub attempt_id: String,
    pub exercise_id: Value,
    pub exercise_name: String,
    pub class_id: Value,
    #[serde(default)]
    pub file_details: Vec<FileDetail>,
}

/// One attached file on a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDetail {
    pub file_path: String,
}

/// Payload of the grade submission call.
///
/// `test_parts` and `user_test_time` are fixed values the grading UI always
/// sends; the mark goes over the wire as a string.
#[derive(Debug, Clone, Serialize)]
pub struct GradePayload {
    pub exercise_id: Value,
    pub exercise_name: String,
    pub test_parts: String,
    pub class_id: Value,
    pub user_test_time: u32,
    pub mark: String,
    pub faculty_comments: String,
}

impl GradePayload {
    /// Build the payload for one graded exercise.
    pub fn new(exercise: &Exercise, mark: u32, feedback_html: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise.exercise_id.clone(),
            exercise_name: exercise.exercise_name.clone(),
            test_parts: "[]".to_string(),
            class_id: exercise.class_id.clone(),
            user_test_time: 0,
            mark: mark.to_string(),
            faculty_comments: feedback_html.into(),
        }
    }
}
