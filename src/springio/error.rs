//! Error types for Spring API operations.

use serde_json::{json, Value};
use thiserror::Error;

/// Result type for Spring API operations.
pub type SpringIoResult<T> = Result<T, SpringIoError>;

/// Errors surfaced by the Spring tools.
///
/// None of these are retried. They reach the tool dispatcher unchanged.
#[derive(Debug, Error)]
pub enum SpringIoError {
    /// Caller-supplied input failed validation. No request was sent.
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument {
        /// Argument name.
        name: String,
        /// Description of what's wrong.
        message: String,
    },

    /// The upstream could not be reached, answered with a non-2xx status, or
    /// returned a body that is not JSON.
    #[error("Upstream request to {host}{path} failed: {cause}")]
    UpstreamRequestFailed {
        /// Upstream host name.
        host: String,
        /// Request path (without query).
        path: String,
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Transport error or status description.
        cause: String,
    },

    /// The upstream answered but the body does not have the expected shape.
    #[error("Malformed response from {host}{path}: {reason}")]
    MalformedUpstreamResponse {
        /// Upstream host name.
        host: String,
        /// Request path (without query).
        path: String,
        /// What did not match.
        reason: String,
    },
}

impl SpringIoError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns a stable, machine-readable name for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::UpstreamRequestFailed { .. } => "upstream_request_failed",
            Self::MalformedUpstreamResponse { .. } => "malformed_upstream_response",
        }
    }

    /// Returns the upstream HTTP status, if one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamRequestFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Renders the error as the JSON body of a failed tool call.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "status": "error",
            "kind": self.kind(),
            "error": self.to_string(),
        });

        match self {
            Self::InvalidArgument { name, .. } => {
                body["argument"] = json!(name);
            }
            Self::UpstreamRequestFailed {
                host, path, status, ..
            } => {
                body["host"] = json!(host);
                body["path"] = json!(path);
                if let Some(status) = status {
                    body["http_status"] = json!(status);
                }
            }
            Self::MalformedUpstreamResponse { host, path, .. } => {
                body["host"] = json!(host);
                body["path"] = json!(path);
            }
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_display_carries_context() {
        let err = SpringIoError::UpstreamRequestFailed {
            host: "api.spring.io".to_string(),
            path: "/projects/spring-boot/releases".to_string(),
            status: Some(500),
            cause: "HTTP 500 Internal Server Error".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("api.spring.io/projects/spring-boot/releases"));
        assert!(msg.contains("500"));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn kinds_are_distinct() {
        let invalid = SpringIoError::invalid_argument("projectId", "must not be empty");
        let malformed = SpringIoError::MalformedUpstreamResponse {
            host: "h".to_string(),
            path: "/p".to_string(),
            reason: "missing _embedded".to_string(),
        };
        assert_eq!(invalid.kind(), "invalid_argument");
        assert_eq!(malformed.kind(), "malformed_upstream_response");
        assert_eq!(malformed.status(), None);
    }

    #[test]
    fn json_body_includes_http_status() {
        let err = SpringIoError::UpstreamRequestFailed {
            host: "calendar.spring.io".to_string(),
            path: "/releases".to_string(),
            status: Some(503),
            cause: "HTTP 503 Service Unavailable".to_string(),
        };
        let body = err.to_json();
        assert_eq!(body["kind"], "upstream_request_failed");
        assert_eq!(body["http_status"], 503);
        assert_eq!(body["path"], "/releases");
    }

    #[test]
    fn json_body_for_transport_failure_has_no_status() {
        let err = SpringIoError::UpstreamRequestFailed {
            host: "api.spring.io".to_string(),
            path: "/projects/x/releases".to_string(),
            status: None,
            cause: "connection refused".to_string(),
        };
        assert!(err.to_json().get("http_status").is_none());
    }
}
