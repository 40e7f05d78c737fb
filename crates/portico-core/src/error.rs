//! Error types for Portico.
//!
//! This module provides [`HttpError`], the standard error type flowing
//! through the request pipeline. Every error maps to an HTTP status
//! code; the pluggable error handlers in `portico-pipeline` turn the
//! error into a response body at the edge.
//!
//! Two kinds of errors deserve special mention:
//!
//! - [`HttpError::Status`] is the *structured status-code error*: an
//!   application deliberately responding with a given status. The
//!   default error handler serializes it as `{"status": N, "message":
//!   "..."}` with that status.
//! - [`HttpError::ResponseAlreadySent`] marks a double write to a
//!   sealed [`ResponseWriter`](crate::ResponseWriter). It is a
//!   programming error and is always surfaced loudly.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`HttpError`].
pub type HttpResult<T> = Result<T, HttpError>;

/// Where a missing parameter was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterLocation {
    /// URL query string.
    Query,
    /// Path segment captured by the route pattern.
    Path,
    /// Request header.
    Header,
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => write!(f, "query string"),
            Self::Path => write!(f, "path"),
            Self::Header => write!(f, "headers"),
        }
    }
}

/// Standard error type for the Portico request pipeline.
///
/// # Example
///
/// ```
/// use portico_core::HttpError;
///
/// fn check_quantity(quantity: u32) -> Result<(), HttpError> {
///     if quantity == 0 {
///         return Err(HttpError::bad_request("quantity must be positive"));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum HttpError {
    /// An application deliberately responding with an explicit status.
    #[error("{message}")]
    Status {
        /// The HTTP status to respond with.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },

    /// The request body did not parse according to its content type.
    #[error("malformed request body: {message}")]
    MalformedBody {
        /// What failed to parse.
        message: String,
    },

    /// A required parameter was absent.
    #[error("required parameter '{name}' not found in {location}")]
    ParameterNotFound {
        /// The parameter name.
        name: String,
        /// Where the lookup happened.
        location: ParameterLocation,
    },

    /// A second write to an already-sent response.
    #[error("response already sent")]
    ResponseAlreadySent,

    /// Internal server error.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HttpError {
    /// Creates a structured status-code error.
    #[must_use]
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request status error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized status error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::status(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden status error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::status(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found status error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict status error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::status(StatusCode::CONFLICT, message)
    }

    /// Creates a malformed-body error.
    #[must_use]
    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }

    /// Creates a missing-parameter error.
    #[must_use]
    pub fn parameter_not_found(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self::ParameterNotFound {
            name: name.into(),
            location,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Status { status, .. } => *status,
            Self::MalformedBody { .. } | Self::ParameterNotFound { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::ResponseAlreadySent | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the message safe to show to clients.
    ///
    /// Internal errors and double-send failures collapse to a generic
    /// message; their details belong in logs, not response bodies.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            Self::MalformedBody { .. } | Self::ParameterNotFound { .. } => self.to_string(),
            Self::ResponseAlreadySent | Self::Internal { .. } => {
                "Internal Server Error".to_string()
            }
        }
    }

    /// Converts this error to the serializable response envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            status: self.status_code().as_u16(),
            message: self.public_message(),
        }
    }
}

/// Serializable `{status, message}` envelope for error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// HTTP status code.
    pub status: u16,
    /// Human-readable error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error() {
        let error = HttpError::status(StatusCode::IM_A_TEAPOT, "short and stout");
        assert_eq!(error.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(error.public_message(), "short and stout");
    }

    #[test]
    fn test_bad_request_helper() {
        let error = HttpError::bad_request("invalid email");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_malformed_body_maps_to_400() {
        let error = HttpError::malformed_body("expected value at line 1");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.public_message().contains("expected value"));
    }

    #[test]
    fn test_parameter_not_found_maps_to_400() {
        let error = HttpError::parameter_not_found("limit", ParameterLocation::Query);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("limit"));
        assert!(error.to_string().contains("query string"));
    }

    #[test]
    fn test_internal_error_is_redacted() {
        let error = HttpError::internal("database connection refused");
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.public_message(), "Internal Server Error");
    }

    #[test]
    fn test_internal_error_keeps_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let error = HttpError::internal_with_source("flush failed", io);

        let source = std::error::Error::source(&error).expect("source should be kept");
        assert!(source.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_response_already_sent() {
        let error = HttpError::ResponseAlreadySent;
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "response already sent");
    }

    #[test]
    fn test_envelope_serialization() {
        let error = HttpError::status(StatusCode::BAD_REQUEST, "quantity must be positive");
        let json = serde_json::to_string(&error.to_envelope()).expect("serializable");

        assert!(json.contains("\"status\":400"));
        assert!(json.contains("quantity must be positive"));
    }
}
