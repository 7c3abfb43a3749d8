//! Upstream error types and handling
//!
//! Every failure talking to the prediction service is classified into one of
//! these variants so callers can decide how to surface it.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by the prediction service client
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The service answered with a non-2xx status
    #[error("Upstream returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection refused, DNS failure, reset, ...
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// No response within the allotted time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The body of a successful response was not the expected JSON
    #[error("Failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias for upstream operations
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Error body shapes the prediction service may send
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl UpstreamError {
    /// Build an error from a non-2xx response
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| {
                b.message.or(b.error).or_else(|| {
                    b.detail.map(|d| match d {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                })
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    trimmed.chars().take(256).collect()
                }
            });

        UpstreamError::Http { status, message }
    }

    /// Classify a transport error from reqwest
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else {
            UpstreamError::Network(err)
        }
    }

    /// Whether this outcome means the service is misbehaving (network,
    /// timeout or any non-2xx response)
    pub fn counts_as_failure(&self) -> bool {
        matches!(
            self,
            UpstreamError::Http { .. } | UpstreamError::Network(_) | UpstreamError::Timeout(_)
        )
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 4xx from upstream
    pub fn is_client_error(&self) -> bool {
        matches!(self.status_code(), Some(400..=499))
    }

    /// 5xx from upstream
    pub fn is_server_error(&self) -> bool {
        matches!(self.status_code(), Some(500..=599))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_fastapi_detail() {
        let error = UpstreamError::from_response(422, r#"{"detail": "ram must be > 0"}"#);

        match error {
            UpstreamError::Http { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "ram must be > 0");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_error_from_plain_text() {
        let error = UpstreamError::from_response(502, "Bad Gateway");
        assert!(error.is_server_error());
        assert!(error.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_error_from_empty_body() {
        let error = UpstreamError::from_response(503, "");
        assert!(error.to_string().contains("HTTP 503"));
    }

    #[test]
    fn test_counts_as_failure() {
        assert!(UpstreamError::from_response(404, "").counts_as_failure());
        assert!(UpstreamError::Timeout(Duration::from_secs(3)).counts_as_failure());
        assert!(!UpstreamError::Configuration("x".to_string()).counts_as_failure());
    }

    #[test]
    fn test_status_classes() {
        let not_found = UpstreamError::from_response(404, "");
        assert!(not_found.is_client_error());
        assert!(!not_found.is_server_error());
        assert_eq!(not_found.status_code(), Some(404));
    }
}
