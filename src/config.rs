//! Runtime configuration.
//!
//! Every setting comes from the environment with a safe non-zero default,
//! so an empty environment still produces a usable (if credential-less)
//! configuration. Credentials are validated separately before a run starts.

use eyre::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for a grading run.
#[derive(Debug, Clone)]
pub struct Config {
    /// LMS API base URL.
    pub base_url: String,
    /// LMS API key, sent as the `apikey` header.
    pub api_key: String,
    /// LMS organisation id, sent as the `orgid` header.
    pub org_id: String,
    /// Review service credential.
    pub gemini_api_key: String,
    /// Review service model name.
    pub gemini_model: String,
    /// Minimum randomized delay between consecutive submissions (seconds).
    pub min_delay_between_requests: f64,
    /// Maximum randomized delay between consecutive submissions (seconds).
    pub max_delay_between_requests: f64,
    /// Minimum randomized delay between batches (seconds).
    pub min_delay_between_batches: f64,
    /// Maximum randomized delay between batches (seconds).
    pub max_delay_between_batches: f64,
    /// Submissions per listing page, and items per pacing batch.
    pub batch_size: u32,
    /// Base delay for the backoff fallback (seconds).
    pub retry_base_delay: u64,
    /// Attempt cap for each throttled request.
    pub max_retries: usize,
    /// Directory downloaded submission files are written to.
    pub download_dir: PathBuf,
    /// Maximum mark a submission can receive.
    pub max_score: u32,
    /// Per-call HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            org_id: String::new(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.0-flash".to_string(),
            min_delay_between_requests: 2.0,
            max_delay_between_requests: 5.0,
            min_delay_between_batches: 5.0,
            max_delay_between_batches: 10.0,
            batch_size: 10,
            retry_base_delay: 10,
            max_retries: 3,
            download_dir: PathBuf::from("assignments"),
            max_score: 100,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            base_url: env_string("BASE_URL").unwrap_or(default.base_url),
            api_key: env_string("API_KEY").unwrap_or(default.api_key),
            org_id: env_string("ORG_ID").unwrap_or(default.org_id),
            gemini_api_key: env_string("GEMINI_API_KEY").unwrap_or(default.gemini_api_key),
            gemini_model: env_string("GEMINI_MODEL").unwrap_or(default.gemini_model),
            min_delay_between_requests: env_parsed("MIN_DELAY_BETWEEN_REQUESTS")
                .unwrap_or(default.min_delay_between_requests),
            max_delay_between_requests: env_parsed("MAX_DELAY_BETWEEN_REQUESTS")
                .unwrap_or(default.max_delay_between_requests),
            min_delay_between_batches: env_parsed("MIN_DELAY_BETWEEN_BATCHES")
                .unwrap_or(default.min_delay_between_batches),
            max_delay_between_batches: env_parsed("MAX_DELAY_BETWEEN_BATCHES")
                .unwrap_or(default.max_delay_between_batches),
            batch_size: env_parsed("BATCH_SIZE").unwrap_or(default.batch_size),
            retry_base_delay: env_parsed("RETRY_BASE_DELAY").unwrap_or(default.retry_base_delay),
            max_retries: env_parsed("MAX_RETRIES").unwrap_or(default.max_retries),
            download_dir: env_string("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.download_dir),
            max_score: default.max_score,
            request_timeout: default.request_timeout,
        }
    }

    /// Validate the configuration before a run.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            eyre::bail!("BASE_URL must be set");
        }
        if self.api_key.is_empty() {
            eyre::bail!("API_KEY must be set");
        }
        if self.org_id.is_empty() {
            eyre::bail!("ORG_ID must be set");
        }
        if self.batch_size == 0 {
            eyre::bail!("BATCH_SIZE must be > 0");
        }
        if self.max_retries == 0 {
            eyre::bail!("MAX_RETRIES must be > 0");
        }
        if self.retry_base_delay == 0 {
            eyre::bail!("RETRY_BASE_DELAY must be > 0");
        }
        if self.min_delay_between_requests > self.max_delay_between_requests {
            eyre::bail!("MIN_DELAY_BETWEEN_REQUESTS must not exceed MAX_DELAY_BETWEEN_REQUESTS");
        }
        if self.min_delay_between_batches > self.max_delay_between_batches {
            eyre::bail!("MIN_DELAY_BETWEEN_BATCHES must not exceed MAX_DELAY_BETWEEN_BATCHES");
        }
        Ok(())
    }

    /// Whether the review service credential is present.
    pub fn review_enabled(&self) -> bool {
        !self.gemini_api_key.is_empty()
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        Config {
            base_url: "https://lms.example.com/api".to_string(),
            api_key: "key".to_string(),
            org_id: "org".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults_are_safe_and_nonzero() {
        let config = Config::default();
        assert!(config.min_delay_between_requests > 0.0);
        assert!(config.max_delay_between_requests >= config.min_delay_between_requests);
        assert!(config.batch_size > 0);
        assert!(config.retry_base_delay > 0);
        assert!(config.max_retries > 0);
        assert_eq!(config.max_score, 100);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_validate_accepts_configured() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_base_url() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let config = Config {
            max_retries: 0,
            ..configured()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_pacing_band() {
        let config = Config {
            min_delay_between_requests: 9.0,
            max_delay_between_requests: 2.0,
            ..configured()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_review_enabled() {
        let mut config = configured();
        assert!(!config.review_enabled());
        config.gemini_api_key = "secret".to_string();
        assert!(config.review_enabled());
    }
}
