//! Request context types.
//!
//! The [`RequestContext`] is the read-side view of one inbound
//! request. Apart from the authenticated-user slot and the typed
//! extension storage (both written by pipeline stages), the context
//! is immutable after construction and owned exclusively by the
//! in-flight request.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::body::RequestBody;
use crate::claims::UserClaims;
use crate::di::ScopedContainer;
use crate::error::{HttpError, HttpResult, ParameterLocation};
use crate::query::QueryParams;
use portico_router::PathParams;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use portico_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    ///
    /// Useful when the request ID was provided by a client or an
    /// upstream service.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Read-only view of one inbound request.
///
/// Created once per request from the buffered transport request and
/// destroyed when the request completes. Pipeline stages may populate
/// the user slot and the typed extensions; everything else is fixed
/// at construction.
///
/// # Example
///
/// ```
/// use portico_core::RequestContext;
/// use http::Method;
///
/// let ctx = RequestContext::mock(Method::GET, "/users/42?expand=posts");
/// assert_eq!(ctx.path(), "/users/42");
/// assert_eq!(ctx.query().first("expand"), Some("posts"));
/// ```
pub struct RequestContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// HTTP method.
    method: Method,

    /// The raw request URI.
    uri: Uri,

    /// Request headers (case-insensitive by construction).
    headers: HeaderMap,

    /// Decoded query parameters.
    query: QueryParams,

    /// Path parameters populated by route matching.
    params: PathParams,

    /// The parsed body.
    body: RequestBody,

    /// The authenticated caller, populated by an auth stage if any.
    user: Option<UserClaims>,

    /// Per-request dependency scope, attached by dispatch.
    services: Option<Arc<ScopedContainer>>,

    /// Type-erased extension data written by pipeline stages.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,

    /// When the request started processing.
    started_at: Instant,
}

impl RequestContext {
    /// Builds a context from buffered request parts.
    ///
    /// The body is parsed according to the `content-type` header.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::MalformedBody`] when the body does not
    /// parse; the caller is expected to route that error through the
    /// configured error handler.
    pub fn from_parts(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> HttpResult<Self> {
        let content_type = headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let body = RequestBody::parse(content_type, body)?;

        Ok(Self::assemble(method, uri, headers, body))
    }

    /// Builds a context without parsing the body.
    ///
    /// Used when body parsing already failed and the error handler
    /// still needs a context to respond with; the raw payload is kept
    /// as bytes.
    #[must_use]
    pub fn with_raw_body(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let body = if body.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Bytes(body)
        };
        Self::assemble(method, uri, headers, body)
    }

    /// Creates a minimal context for tests.
    #[must_use]
    pub fn mock(method: Method, uri: &str) -> Self {
        let uri: Uri = uri.parse().expect("valid test URI");
        Self::assemble(method, uri, HeaderMap::new(), RequestBody::Empty)
    }

    fn assemble(method: Method, uri: Uri, headers: HeaderMap, body: RequestBody) -> Self {
        let query = uri.query().map_or_else(QueryParams::empty, QueryParams::parse);
        Self {
            request_id: RequestId::new(),
            method,
            uri,
            headers,
            query,
            params: PathParams::new(),
            body,
            user: None,
            services: None,
            extensions: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request ID.
    ///
    /// Used by the request-id stage when a client supplied its own
    /// correlation ID.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the raw request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the header map.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a header value or fails with a missing-parameter error.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::ParameterNotFound`] when the header is
    /// absent or not representable as a string.
    pub fn require_header(&self, name: &str) -> HttpResult<&str> {
        self.header(name)
            .ok_or_else(|| HttpError::parameter_not_found(name, ParameterLocation::Header))
    }

    /// Returns the decoded query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Returns the path parameters.
    #[must_use]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns a path parameter or fails.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::ParameterNotFound`] when the pattern did
    /// not capture the name.
    pub fn require_param(&self, name: &str) -> HttpResult<&str> {
        self.param(name)
            .ok_or_else(|| HttpError::parameter_not_found(name, ParameterLocation::Path))
    }

    /// Replaces the path parameters after route matching.
    pub fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    /// Returns the parsed body.
    #[must_use]
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Returns the authenticated caller, if one was attached.
    #[must_use]
    pub fn user(&self) -> Option<&UserClaims> {
        self.user.as_ref()
    }

    /// Attaches the authenticated caller.
    ///
    /// Called by authentication interceptors or guards.
    pub fn set_user(&mut self, user: UserClaims) {
        self.user = Some(user);
    }

    /// Returns the per-request dependency scope, if one was attached.
    #[must_use]
    pub fn services(&self) -> Option<&Arc<ScopedContainer>> {
        self.services.as_ref()
    }

    /// Attaches the per-request dependency scope.
    pub fn set_services(&mut self, services: Arc<ScopedContainer>) {
        self.services = Some(services);
    }

    /// Stores a typed extension value.
    ///
    /// Extensions let pipeline stages hand request-scoped data to
    /// later stages and handlers.
    ///
    /// # Example
    ///
    /// ```
    /// use portico_core::RequestContext;
    /// use http::Method;
    ///
    /// #[derive(Clone)]
    /// struct RateLimitInfo {
    ///     remaining: u32,
    /// }
    ///
    /// let mut ctx = RequestContext::mock(Method::GET, "/");
    /// ctx.set_extension(RateLimitInfo { remaining: 100 });
    ///
    /// let info = ctx.get_extension::<RateLimitInfo>().unwrap();
    /// assert_eq!(info.remaining, 100);
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("params", &self.params)
            .field("user", &self.user)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
