//! Test client for in-memory HTTP testing.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use portico_server::App;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// A client driving an [`App`] entirely in memory.
///
/// Requests go straight through `App::dispatch_parts` — the full
/// pipeline runs, but no port is bound and no socket is involved.
///
/// # Example
///
/// ```rust
/// use portico_server::{App, handler_fn};
/// use portico_test::TestClient;
/// use http::{Method, StatusCode};
///
/// # tokio_test::block_on(async {
/// let app = App::builder()
///     .route(Method::GET, "/users/:id", handler_fn(|req, res| {
///         Box::pin(async move {
///             let id = req.require_param("id")?.to_string();
///             res.status(StatusCode::OK).text(id);
///             Ok(())
///         })
///     }))
///     .build()
///     .unwrap();
///
/// let client = TestClient::new(app);
/// let response = client.get("/users/42").send().await;
/// assert_eq!(response.text().unwrap(), "42");
/// # });
/// ```
#[must_use]
pub struct TestClient {
    app: Arc<App>,
    /// Default headers added to every request.
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client over an assembled application.
    pub fn new(app: App) -> Self {
        Self {
            app: Arc::new(app),
            default_headers: Vec::new(),
        }
    }

    /// Creates a client over a shared application.
    pub fn from_shared(app: Arc<App>) -> Self {
        Self {
            app,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header included in every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::patch(uri))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Creates a request builder with an arbitrary method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    async fn send_internal(&self, request: TestRequest) -> TestResponse {
        let response = self
            .app
            .dispatch_parts(request.method, request.uri, request.headers, request.body)
            .await;
        TestResponse::from_http(response).await
    }
}

/// A request builder bound to a test client.
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let mut builder = builder;
        for (name, value) in &client.default_headers {
            builder = builder.header(name, value);
        }
        Self { client, builder }
    }

    /// Sets a header on the request.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    #[must_use]
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the Authorization header with a Bearer token.
    #[must_use]
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Sets the raw request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON request body.
    #[must_use]
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request and returns the buffered response.
    ///
    /// # Panics
    ///
    /// Panics when the request itself is malformed; use
    /// [`try_send`](Self::try_send) to handle that as a result.
    pub async fn send(self) -> TestResponse {
        self.try_send().await.expect("valid test request")
    }

    /// Sends the request, reporting build failures as errors.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] when the request could not be built.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        Ok(self.client.send_internal(request).await)
    }
}
