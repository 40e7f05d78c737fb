//! Response writer with a send-once seal.
//!
//! [`ResponseWriter`] is the mutable build side of a request: pending
//! status, ordered headers, and at most one content value. Calling
//! [`ResponseWriter::send`] seals the writer exactly once; a second
//! call fails with [`HttpError::ResponseAlreadySent`]. This is the
//! invariant that makes double responses impossible to miss.

use std::path::PathBuf;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

use crate::error::{HttpError, HttpResult};

/// The HTTP response type produced by a sealed writer.
pub type Response = http::Response<Full<Bytes>>;

/// Pending response content. At most one is set per response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseContent {
    /// No body.
    None,
    /// Pre-serialized JSON bytes.
    Json(Bytes),
    /// Plain text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// A file read from disk at send time.
    File(PathBuf),
}

impl ResponseContent {
    /// Returns the implicit content type for this content, if any.
    fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Json(_) => Some("application/json"),
            Self::Text(_) => Some("text/plain; charset=utf-8"),
            Self::Bytes(_) | Self::File(_) => Some("application/octet-stream"),
        }
    }
}

#[derive(Debug)]
enum WriterState {
    Pending {
        status: Option<StatusCode>,
        headers: Vec<(HeaderName, HeaderValue)>,
        content: ResponseContent,
    },
    Sent(Sealed),
}

#[derive(Debug)]
struct Sealed {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    content_type: Option<&'static str>,
    body: Bytes,
}

/// Mutable response builder with a send-once seal.
///
/// Builder calls are chainable and mutate pending state. Once
/// [`send`](Self::send) has sealed the writer, further mutators are
/// warn-logged no-ops and a second `send` fails with
/// [`HttpError::ResponseAlreadySent`].
///
/// # Example
///
/// ```
/// use portico_core::ResponseWriter;
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let mut res = ResponseWriter::new();
/// res.status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(&serde_json::json!({"id": 42}))
///     .unwrap();
/// res.send().await.unwrap();
///
/// assert!(res.is_sent());
/// assert!(res.send().await.is_err());
/// # });
/// ```
#[derive(Debug)]
pub struct ResponseWriter {
    state: WriterState,
}

impl ResponseWriter {
    /// Creates a writer with no status, headers, or content decided.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: WriterState::Pending {
                status: None,
                headers: Vec::new(),
                content: ResponseContent::None,
            },
        }
    }

    /// Returns true once the writer has been sealed.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self.state, WriterState::Sent(_))
    }

    /// Returns the decided status code, pending or sealed.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match &self.state {
            WriterState::Pending { status, .. } => *status,
            WriterState::Sent(sealed) => Some(sealed.status),
        }
    }

    /// Sets the pending status code.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        if let WriterState::Pending { status: slot, .. } = &mut self.state {
            *slot = Some(status);
        } else {
            tracing::warn!("status() ignored: response already sent");
        }
        self
    }

    /// Appends a header. At seal time later entries override earlier
    /// ones with the same name.
    ///
    /// Invalid header names or values are warn-logged and dropped.
    pub fn header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> &mut Self {
        if let WriterState::Pending { headers, .. } = &mut self.state {
            match (
                HeaderName::from_bytes(name.as_ref().as_bytes()),
                HeaderValue::from_str(value.as_ref()),
            ) {
                (Ok(name), Ok(value)) => headers.push((name, value)),
                _ => tracing::warn!(header = name.as_ref(), "invalid header dropped"),
            }
        } else {
            tracing::warn!("header() ignored: response already sent");
        }
        self
    }

    /// Sets JSON content, serializing the value now.
    ///
    /// # Errors
    ///
    /// Returns an internal error when serialization fails.
    pub fn json<T: Serialize>(&mut self, value: &T) -> HttpResult<&mut Self> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| HttpError::internal_with_source("JSON serialization failed", e))?;
        self.set_content(ResponseContent::Json(Bytes::from(bytes)));
        Ok(self)
    }

    /// Sets plain-text content.
    pub fn text(&mut self, body: impl Into<String>) -> &mut Self {
        self.set_content(ResponseContent::Text(body.into()));
        self
    }

    /// Sets raw byte content.
    pub fn bytes(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.set_content(ResponseContent::Bytes(body.into()));
        self
    }

    /// Sets file content, read from disk when the writer is sent.
    pub fn file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.set_content(ResponseContent::File(path.into()));
        self
    }

    fn set_content(&mut self, new: ResponseContent) {
        if let WriterState::Pending { content, .. } = &mut self.state {
            *content = new;
        } else {
            tracing::warn!("content ignored: response already sent");
        }
    }

    /// Seals the writer.
    ///
    /// The pending status (200 when unset), headers, and content are
    /// frozen; file content is read from disk here. The returned
    /// future resolves once sealing completes — the transport flush
    /// happens when the connection task writes the sealed response.
    ///
    /// # Errors
    ///
    /// - [`HttpError::ResponseAlreadySent`] on a second call.
    /// - An internal error when file content cannot be read; the
    ///   writer stays pending so an error handler can still respond.
    pub async fn send(&mut self) -> HttpResult<()> {
        let (status, headers, content) = match &mut self.state {
            WriterState::Sent(_) => return Err(HttpError::ResponseAlreadySent),
            WriterState::Pending {
                status,
                headers,
                content,
            } => (
                status.unwrap_or(StatusCode::OK),
                std::mem::take(headers),
                std::mem::replace(content, ResponseContent::None),
            ),
        };

        let content_type = content.content_type();
        let body = match content {
            ResponseContent::None => Bytes::new(),
            ResponseContent::Json(bytes) | ResponseContent::Bytes(bytes) => bytes,
            ResponseContent::Text(text) => Bytes::from(text),
            ResponseContent::File(path) => match tokio::fs::read(&path).await {
                Ok(data) => Bytes::from(data),
                Err(e) => {
                    // Restore the pending state minus the unreadable file.
                    self.state = WriterState::Pending {
                        status: Some(status),
                        headers,
                        content: ResponseContent::None,
                    };
                    return Err(HttpError::internal_with_source(
                        format!("failed to read response file '{}'", path.display()),
                        e,
                    ));
                }
            },
        };

        self.state = WriterState::Sent(Sealed {
            status,
            headers,
            content_type,
            body,
        });
        Ok(())
    }

    /// Converts the writer into the final HTTP response.
    ///
    /// A writer that was never sent seals with its pending state
    /// (unset status becomes 200, file content becomes empty); the
    /// dispatch loop always sends before converting, so that path is
    /// a fallback.
    #[must_use]
    pub fn into_response(self) -> Response {
        let sealed = match self.state {
            WriterState::Sent(sealed) => sealed,
            WriterState::Pending {
                status,
                headers,
                content,
            } => {
                let content_type = content.content_type();
                let body = match content {
                    ResponseContent::Json(bytes) | ResponseContent::Bytes(bytes) => bytes,
                    ResponseContent::Text(text) => Bytes::from(text),
                    ResponseContent::None | ResponseContent::File(_) => Bytes::new(),
                };
                Sealed {
                    status: status.unwrap_or(StatusCode::OK),
                    headers,
                    content_type,
                    body,
                }
            }
        };

        let mut response = http::Response::new(Full::new(sealed.body));
        *response.status_mut() = sealed.status;

        let header_map = response.headers_mut();
        if let Some(ct) = sealed.content_type {
            header_map.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        // Later writes override earlier ones for the same name.
        for (name, value) in sealed.headers {
            header_map.insert(name, value);
        }

        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}
