//! Test client error types.

use thiserror::Error;

/// Errors raised while building or sending test requests.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request URI did not parse.
    #[error("invalid test URI: {0}")]
    InvalidUri(String),

    /// A header name or value did not parse.
    #[error("invalid test header '{name}': {reason}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A JSON body failed to serialize.
    #[error("failed to serialize JSON body: {0}")]
    JsonBody(#[from] serde_json::Error),

    /// The response body was not valid UTF-8.
    #[error("response body is not valid UTF-8")]
    NonUtf8Body,
}
