//! Request body model.
//!
//! The body of an incoming request is buffered by the transport and
//! parsed exactly once into [`RequestBody`], driven by the
//! `content-type` header.

use crate::error::{HttpError, HttpResult};
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// A fully buffered, parsed request body.
///
/// Parsing rules:
///
/// - `application/json` → [`RequestBody::Json`]; invalid JSON fails
///   with [`HttpError::MalformedBody`].
/// - `text/plain` → [`RequestBody::Text`]; invalid UTF-8 fails with
///   [`HttpError::MalformedBody`].
/// - any other content type with a non-empty payload →
///   [`RequestBody::Bytes`].
/// - an empty payload → [`RequestBody::Empty`] regardless of header.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// Parsed JSON document.
    Json(serde_json::Value),
    /// Plain UTF-8 text.
    Text(String),
    /// Raw bytes of an unrecognized content type.
    Bytes(Bytes),
}

impl RequestBody {
    /// Parses buffered bytes according to the content type.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::MalformedBody`] when a JSON body does not
    /// parse or a text body is not valid UTF-8.
    pub fn parse(content_type: Option<&str>, bytes: Bytes) -> HttpResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::Empty);
        }

        let mime = content_type.and_then(|ct| ct.parse::<mime::Mime>().ok());

        match mime {
            Some(m) if m.type_() == mime::APPLICATION && m.subtype() == mime::JSON => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| HttpError::malformed_body(format!("invalid JSON: {e}")))?;
                Ok(Self::Json(value))
            }
            Some(m) if m.type_() == mime::TEXT && m.subtype() == mime::PLAIN => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|e| HttpError::malformed_body(format!("invalid UTF-8: {e}")))?;
                Ok(Self::Text(text))
            }
            _ => Ok(Self::Bytes(bytes)),
        }
    }

    /// Returns true if there is no body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the parsed JSON document, if this is a JSON body.
    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the text content, if this is a text body.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the raw bytes, if this is a byte body.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Deserializes a JSON body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::MalformedBody`] when the body is not JSON
    /// or does not match the target shape.
    pub fn json_as<T: DeserializeOwned>(&self) -> HttpResult<T> {
        match self {
            Self::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| HttpError::malformed_body(format!("unexpected JSON shape: {e}"))),
            _ => Err(HttpError::malformed_body("expected a JSON body")),
        }
    }
}
