//! Error types for the client library.

use reqwest_retry::RetryError;
use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the appliance.
///
/// Pi-hole wraps failures as `{"error": {"key": ..., "message": ..., "hint": ...}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// The error detail object from the API.
    pub error: ErrorDetail,
}

/// Detailed error information from the API.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error key (e.g. `unauthorized`).
    #[serde(default)]
    pub key: Option<String>,
    /// The error message text describing what went wrong.
    pub message: String,
    /// Optional hint from the appliance.
    #[serde(default)]
    pub hint: Option<String>,
}

/// Errors that can occur when talking to a Pi-hole appliance.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or HTTP request failure.
    ///
    /// Indicates issues like DNS resolution, connection failures, or socket errors.
    #[error("Request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Middleware layer error.
    #[error("Request failed: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    /// JSON serialization error while encoding a request.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The credential exchange failed.
    ///
    /// Raised on transport failure, a non-success status, or a response
    /// without a session identifier. The session stays unauthenticated.
    #[error("Pi-hole authentication error: {0}")]
    AuthenticationError(String),

    /// Non-success response from the appliance.
    ///
    /// Carries enough context to diagnose the failing call.
    #[error("Pi-hole API error: {status} {status_text} - Response: {body} - URL: {path}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
        /// Raw response body.
        body: String,
        /// Request path, including any query string.
        path: String,
    },

    /// The request exceeded the configured timeout.
    #[error("Request to {path} timed out")]
    TimeoutError {
        /// Request path.
        path: String,
    },

    /// A success response whose body is not JSON.
    #[error("Invalid response from {path}: {message}")]
    InvalidResponse {
        /// Request path.
        path: String,
        /// Parse failure description.
        message: String,
    },

    /// The operation name does not exist in the operation table.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// A required parameter is missing or malformed.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Client configuration issue.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl ClientError {
    /// Check if this is an authentication error.
    #[must_use]
    pub const fn is_authentication_error(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }

    /// The HTTP status carried by an upstream error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Maps a transport failure, singling out timeouts.
    ///
    /// The retry middleware wraps every failure in a [`RetryError`], even
    /// when no retry happened; the underlying `reqwest` error is unwrapped
    /// from it.
    pub(crate) fn from_transport(err: reqwest_middleware::Error, path: &str) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => Self::TimeoutError {
                path: path.to_string(),
            },
            reqwest_middleware::Error::Reqwest(e) => Self::NetworkError(e),
            reqwest_middleware::Error::Middleware(inner) => match inner.downcast::<RetryError>() {
                Ok(RetryError::WithRetries { err, .. } | RetryError::Error(err)) => {
                    Self::from_transport(err, path)
                }
                Err(other) => Self::MiddlewareError(reqwest_middleware::Error::Middleware(other)),
            },
        }
    }
}

/// Extracts a readable message from an error body, falling back to the raw text.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body).map_or_else(
        |_| body.to_string(),
        |parsed| match parsed.error.hint {
            Some(hint) if !hint.is_empty() => format!("{} ({hint})", parsed.error.message),
            _ => parsed.error.message,
        },
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn test_api_error_display_carries_context() {
        let err = ClientError::ApiError {
            status: 404,
            status_text: "Not Found".to_string(),
            body: "{\"error\":{}}".to_string(),
            path: "/api/domains/allow/exact/example.com".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404 Not Found"));
        assert!(msg.contains("{\"error\":{}}"));
        assert!(msg.contains("/api/domains/allow/exact/example.com"));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_unrelated_middleware_error_is_kept() {
        let err = ClientError::from_transport(
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("signing failed")),
            "/api/stats/summary",
        );
        assert!(matches!(err, ClientError::MiddlewareError(_)));
        assert!(err.to_string().contains("signing failed"));
    }

    #[test]
    fn test_error_message_structured() {
        let body = r#"{"error":{"key":"bad_request","message":"Invalid domain","hint":"use FQDN"}}"#;
        assert_eq!(error_message(body), "Invalid domain (use FQDN)");

        let body = r#"{"error":{"key":"unauthorized","message":"Unauthorized","hint":null}}"#;
        assert_eq!(error_message(body), "Unauthorized");
    }

    #[test]
    fn test_error_message_raw_fallback() {
        assert_eq!(error_message("<html>502</html>"), "<html>502</html>");
    }
}
