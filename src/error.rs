//! Error types for gradr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in gradr
#[derive(Debug, Error)]
pub enum GradrError {
    /// Retry budget exhausted for a throttled resource
    #[error("Failed to reach {resource} after {attempts} attempts")]
    RetriesExhausted { resource: String, attempts: usize },

    /// Non-retryable HTTP error status
    #[error("HTTP {status} from {resource}: {message}")]
    Http {
        resource: String,
        status: u16,
        message: String,
    },

    /// Transport-level request failure (connection refused, DNS, TLS)
    #[error("Request to {resource} failed: {source}")]
    Transport {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    /// Review service error
    #[error("Review error: {0}")]
    Review(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Local file download/cleanup error
    #[error("Download error for {path}: {message}")]
    Download { path: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for gradr operations
pub type Result<T> = std::result::Result<T, GradrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_error() {
        let err = GradrError::RetriesExhausted {
            resource: "submission detail".to_string(),
            attempts: 3,
        };
        assert_eq!(err.to_string(), "Failed to reach submission detail after 3 attempts");
    }

    #[test]
    fn test_http_error() {
        let err = GradrError::Http {
            resource: "grade submission".to_string(),
            status: 403,
            message: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 403 from grade submission: forbidden");
    }

    #[test]
    fn test_review_error() {
        let err = GradrError::Review("upload rejected".to_string());
        assert_eq!(err.to_string(), "Review error: upload rejected");
    }

    #[test]
    fn test_config_error() {
        let err = GradrError::Config("BASE_URL not set".to_string());
        assert_eq!(err.to_string(), "Config error: BASE_URL not set");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GradrError = io_err.into();
        assert!(matches!(err, GradrError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: GradrError = json_err.into();
        assert!(matches!(err, GradrError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(GradrError::Config("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
