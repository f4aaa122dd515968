//! HTTP client for the LMS API.
//!
//! One method per operation a grading run needs: list pending submissions,
//! fetch one submission's detail, submit a grade, and fetch a raw file.
//! Every method returns a `CallResult` so the retrying executor (or the
//! prober) can classify what went wrong; the client itself never retries.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::config::Config;
use crate::error::{GradrError, Result};
use crate::lms::types::{GradePayload, Submission, SubmissionDetail, SubmissionPage};
use crate::throttle::executor::{CallFailure, CallResult};
use crate::throttle::signal::{self, RateLimitSignal};

/// Response headers worth logging when the limiter trips.
const RATE_LIMIT_HEADERS: &[&str] = &[
    "retry-after",
    "x-ratelimit-limit",
    "x-ratelimit-remaining",
    "x-ratelimit-reset",
    "x-rate-limit-limit",
    "x-rate-limit-remaining",
];

/// The LMS operations a grading run performs.
#[async_trait]
pub trait LmsClient: Send + Sync {
    /// List one page of pending submissions. An empty page ends paging.
    async fn list_submissions(&self, page: u32, per_page: u32) -> CallResult<Vec<Submission>>;

    /// Fetch the detail record for one submission. This is the endpoint the
    /// upstream limiter actually throttles.
    async fn fetch_detail(&self, attempt_id: &str) -> CallResult<SubmissionDetail>;

    /// Submit a mark and feedback for one attempt.
    async fn submit_grade(&self, attempt_id: &str, payload: &GradePayload) -> CallResult<Value>;

    /// Fetch the raw bytes of an attached file.
    async fn fetch_file(&self, url: &str) -> CallResult<Vec<u8>>;
}

/// reqwest-backed [`LmsClient`].
pub struct HttpLmsClient {
    client: Client,
    base_url: String,
    api_key: String,
    org_id: String,
}

impl HttpLmsClient {
    /// Build a client from the run configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GradrError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            org_id: config.org_id.clone(),
        })
    }

    fn listing_url(&self, page: u32, per_page: u32) -> String {
        format!(
            "{}/submissions?page={page}&per_page={per_page}&evaluated=0&sort_order=D&sort_by=submission_time",
            self.base_url
        )
    }

    fn detail_url(&self, attempt_id: &str) -> String {
        format!("{}/assignment/pasttest/{attempt_id}", self.base_url)
    }

    fn marks_url(&self, attempt_id: &str) -> String {
        format!("{}/assignment/attempt/{attempt_id}/marks", self.base_url)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("apikey", &self.api_key)
            .header("orgid", &self.org_id)
    }

    /// Turn a non-success response into a `CallFailure`, logging rate-limit
    /// diagnostics before the backoff begins.
    async fn classify_failure(resource: &str, response: Response) -> CallFailure {
        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .map(String::from);
            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .filter(|(name, _)| RATE_LIMIT_HEADERS.contains(&name.as_str()))
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
                })
                .collect();
            let body = response.text().await.unwrap_or_default();
            signal::log_throttle_diagnostics(resource, &headers, &body);
            CallFailure::RateLimited(RateLimitSignal::from_parts(
                status,
                retry_after.as_deref(),
                &body,
            ))
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "no response body".to_string());
            CallFailure::Status { status, message }
        }
    }

    fn map_transport(err: reqwest::Error) -> CallFailure {
        if err.is_timeout() {
            CallFailure::TimedOut
        } else {
            CallFailure::Transport(err)
        }
    }
}

#[async_trait]
impl LmsClient for HttpLmsClient {
    async fn list_submissions(&self, page: u32, per_page: u32) -> CallResult<Vec<Submission>> {
        let response = self
            .get(&self.listing_url(page, per_page))
            .send()
            .await
            .map_err(Self::map_transport)?;

        if !response.status().is_success() {
            return Err(Self::classify_failure("submission listing", response).await);
        }

        let page: SubmissionPage = response.json().await.map_err(Self::map_transport)?;
        Ok(page.submissions)
    }

    async fn fetch_detail(&self, attempt_id: &str) -> CallResult<SubmissionDetail> {
        let response = self
            .get(&self.detail_url(attempt_id))
            .send()
            .await
            .map_err(Self::map_transport)?;

        if !response.status().is_success() {
            return Err(Self::classify_failure("submission detail", response).await);
        }

        response.json().await.map_err(Self::map_transport)
    }

    async fn submit_grade(&self, attempt_id: &str, payload: &GradePayload) -> CallResult<Value> {
        let json = serde_json::to_string(payload)
            .map_err(|e| CallFailure::Status {
                status: 0,
                message: format!("failed to encode grade payload: {e}"),
            })?;
        let form = reqwest::multipart::Form::new().text("JSONString", json);

        let response = self
            .client
            .post(self.marks_url(attempt_id))
            .header("apikey", &self.api_key)
            .header("orgid", &self.org_id)
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_transport)?;

        if !response.status().is_success() {
            return Err(Self::classify_failure("grade submission", response).await);
        }

        response.json().await.map_err(Self::map_transport)
    }

    async fn fetch_file(&self, url: &str) -> CallResult<Vec<u8>> {
        // File links are pre-signed storage URLs; no auth headers wanted.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Self::map_transport)?;

        if !response.status().is_success() {
            return Err(Self::classify_failure("file download", response).await);
        }

        let bytes = response.bytes().await.map_err(Self::map_transport)?;
        Ok(bytes.to_vec())
    }
}

impl std::fmt::Debug for HttpLmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLmsClient")
            .field("base_url", &self.base_url)
            .field("org_id", &self.org_id)
            .finish()
    }
}
