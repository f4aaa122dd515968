//! Gemini-backed review adapter.
//!
//! Uploads the submission PDF to the Gemini file API, then generates a
//! review against the uploaded file with the instructor prompt. Internal
//! failures retry with incremental waits; exhausting them marks the outcome
//! as a terminal failure so the run stops instead of silently zero-grading
//! gradable work.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

use crate::error::{GradrError, Result};
use crate::review::feedback;
use crate::review::{Reviewer, ReviewOutcome};

/// Gemini generate endpoint base.
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini file upload endpoint.
const GEMINI_UPLOAD_URL: &str = "https://generativelanguage.googleapis.com/upload/v1beta/files";

/// Default model to use.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Attempts before reviewing is declared broken.
const MAX_REVIEW_ATTEMPTS: u32 = 3;

/// Incremental wait between attempts (5s, then 10s).
const RETRY_STEP: Duration = Duration::from_secs(5);

/// Configuration for the Gemini reviewer.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiConfig {
    /// Create a config with a specific model.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Review adapter backed by the Gemini API.
pub struct GeminiReviewer {
    client: Client,
    api_key: String,
    config: GeminiConfig,
}

impl GeminiReviewer {
    pub fn new(api_key: String, config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GradrError::Review(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// The instructor prompt, personalized with the student's first name.
    fn build_prompt(student_name: Option<&str>, max_score: u32) -> String {
        let first_name = student_name
            .and_then(|name| name.split_whitespace().next())
            .map(|name| format!(" {name}"))
            .unwrap_or_default();

        format!(
            r#"You are a programming instructor reviewing this student's assignment. Give helpful feedback.

STRICT RULES:
- MAXIMUM 800 characters total (CRITICAL - will be truncated if longer)
- Be warm, sound like a real teacher (never mention AI)
- Give specific feedback with examples
- Balance praise with constructive criticism

FORMAT:

=== REVIEW ===
Hi{first_name}! [1 sentence about submission]

**Strengths:**
- [2-3 brief specific points about what worked well]

**Areas for Improvement:**
- [2-3 brief points: what's wrong, how to fix]

**Moving Forward:**
- [1 tip for improvement]


=== SCORE ===
MARKS: [number 0-{max_score}]

KEEP IT BRIEF! Reference specific problems from the PDF. Max 800 characters!
"#
        )
    }

    fn upload_url(&self) -> String {
        format!("{GEMINI_UPLOAD_URL}?key={}", self.api_key)
    }

    fn generate_url(&self) -> String {
        format!(
            "{GEMINI_API_URL}/models/{}:generateContent?key={}",
            self.config.model, self.api_key
        )
    }

    fn build_generate_body(prompt: &str, file_uri: &str) -> Value {
        json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "file_data": { "mime_type": "application/pdf", "file_uri": file_uri } }
                ]
            }]
        })
    }

    fn parse_file_uri(body: &Value) -> Result<String> {
        body["file"]["uri"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| GradrError::Review("upload response missing file uri".to_string()))
    }

    fn parse_review_text(body: &Value) -> Result<String> {
        body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| GradrError::Review("empty review response".to_string()))
    }

    async fn upload_pdf(&self, file: &Path) -> Result<String> {
        let bytes = tokio::fs::read(file).await?;

        let response = self
            .client
            .post(self.upload_url())
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", "application/pdf")
            .body(bytes)
            .send()
            .await
            .map_err(|e| GradrError::Review(format!("upload request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GradrError::Review(format!(
                "upload failed with {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GradrError::Review(format!("failed to parse upload response: {e}")))?;
        Self::parse_file_uri(&body)
    }

    async fn generate_review(&self, prompt: &str, file_uri: &str) -> Result<String> {
        let body = Self::build_generate_body(prompt, file_uri);

        let response = self
            .client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| GradrError::Review(format!("generate request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GradrError::Review(format!(
                "generate failed with {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GradrError::Review(format!("failed to parse generate response: {e}")))?;
        Self::parse_review_text(&body)
    }

    async fn review_once(
        &self,
        file: &Path,
        student_name: Option<&str>,
        max_score: u32,
    ) -> Result<(String, u32)> {
        let file_uri = self.upload_pdf(file).await?;
        tracing::info!(file = %file.display(), "uploaded file for review");

        let prompt = Self::build_prompt(student_name, max_score);
        let text = self.generate_review(&prompt, &file_uri).await?;
        let text = feedback::truncate_feedback(&text);

        let score = feedback::parse_score(&text, max_score).unwrap_or_else(|| {
            let fallback = feedback::default_score(max_score);
            tracing::warn!(fallback, "could not parse a score from the review");
            fallback
        });

        Ok((text, score))
    }
}

#[async_trait]
impl Reviewer for GeminiReviewer {
    async fn review(
        &self,
        file: &Path,
        student_name: Option<&str>,
        max_score: u32,
    ) -> ReviewOutcome {
        let mut last_error = String::new();

        for attempt in 0..MAX_REVIEW_ATTEMPTS {
            if attempt > 0 {
                let wait = RETRY_STEP * attempt;
                tracing::info!(
                    attempt = attempt + 1,
                    max_attempts = MAX_REVIEW_ATTEMPTS,
                    wait_secs = wait.as_secs(),
                    "retrying review"
                );
                tokio::time::sleep(wait).await;
            }

            match self.review_once(file, student_name, max_score).await {
                Ok((text, score)) => {
                    tracing::info!(score, max_score, "review complete");
                    return ReviewOutcome::reviewed(text, score, attempt + 1);
                }
                Err(err) => {
                    tracing::warn!(attempt = attempt + 1, %err, "review attempt failed");
                    last_error = err.to_string();
                }
            }
        }

        tracing::error!(error = %last_error, "review attempts exhausted");
        ReviewOutcome::broken(last_error, MAX_REVIEW_ATTEMPTS)
    }
}

impl std::fmt::Debug for GeminiReviewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiReviewer")
            .field("model", &self.config.model)
            .finish()
    }
}
