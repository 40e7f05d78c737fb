//! Test request construction.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

use crate::error::TestError;

/// A fully built test request, ready for dispatch.
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URI (path and optional query).
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Buffered request body.
    pub body: Bytes,
}

impl TestRequest {
    /// Starts a GET request builder.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Starts a POST request builder.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Starts a PUT request builder.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Starts a PATCH request builder.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Starts a DELETE request builder.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }
}

/// Builder for [`TestRequest`].
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    json_error: Option<serde_json::Error>,
}

impl TestRequestBuilder {
    /// Creates a builder with a method and URI.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
            json_error: None,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.headers
            .push((name.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Sets the Content-Type header.
    #[must_use]
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header("content-type", content_type)
    }

    /// Sets the Authorization header with a Bearer token.
    #[must_use]
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header("authorization", value)
    }

    /// Sets the raw request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and the matching content type.
    ///
    /// Serialization failures are reported when the request is built.
    #[must_use]
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.content_type("application/json")
            }
            Err(e) => {
                self.json_error = Some(e);
                self
            }
        }
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] for an unparsable URI or header, or a
    /// JSON body that failed to serialize.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.json_error {
            return Err(TestError::JsonBody(error));
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|_| TestError::InvalidUri(self.uri.clone()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            let header_name: http::header::HeaderName =
                name.parse().map_err(|e| TestError::InvalidHeader {
                    name: name.clone(),
                    reason: format!("{e}"),
                })?;
            let header_value: http::header::HeaderValue =
                value.parse().map_err(|e| TestError::InvalidHeader {
                    name: name.clone(),
                    reason: format!("{e}"),
                })?;
            headers.append(header_name, header_value);
        }

        Ok(TestRequest {
            method: self.method,
            uri,
            headers,
            body: self.body,
        })
    }
}
