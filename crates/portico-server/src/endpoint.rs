//! Endpoint records and handler adapters.
//!
//! An [`Endpoint`] is the registration record the route table stores:
//! a handler plus the ordered pipeline steps attached at registration
//! time. Endpoints are immutable after registration.

use std::sync::Arc;

use http::Method;
use portico_core::{HttpResult, RequestContext, ResponseWriter};
use portico_pipeline::{
    BoxFuture, Guard, Interceptor, Middleware, PipelineStep,
};

/// A request handler: the terminal unit of a matched route.
///
/// Handlers read from the [`RequestContext`] and write through the
/// [`ResponseWriter`]; an explicit `send()` is optional — the chain's
/// terminal step sends whatever the handler built.
pub trait Handler: Send + Sync + 'static {
    /// Handles a matched request.
    fn call<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseWriter,
    ) -> BoxFuture<'a, HttpResult<()>>;
}

/// A handler created from a function.
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext, &'a mut ResponseWriter) -> BoxFuture<'a, HttpResult<()>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext, &'a mut ResponseWriter) -> BoxFuture<'a, HttpResult<()>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseWriter,
    ) -> BoxFuture<'a, HttpResult<()>> {
        (self.func)(req, res)
    }
}

/// Wraps a function into a [`Handler`].
///
/// # Example
///
/// ```rust
/// use portico_server::handler_fn;
/// use http::StatusCode;
///
/// let handler = handler_fn(|_req, res| {
///     Box::pin(async move {
///         res.status(StatusCode::OK).text("pong");
///         Ok(())
///     })
/// });
/// ```
pub fn handler_fn<F>(func: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext, &'a mut ResponseWriter) -> BoxFuture<'a, HttpResult<()>>
        + Send
        + Sync
        + 'static,
{
    FnHandler::new(func)
}

/// Ordered pipeline steps attached to one route.
///
/// Middleware, guards, and interceptors keep their declaration order
/// within the route level — a guard declared after a middleware runs
/// after it.
///
/// # Example
///
/// ```rust
/// use portico_server::RouteOptions;
/// use portico_pipeline::PredicateGuard;
/// use portico_core::RequestContext;
///
/// let options = RouteOptions::new()
///     .guard(PredicateGuard::new("api-key", |req: &RequestContext| {
///         req.header("x-api-key") == Some("secret")
///     }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    steps: Vec<PipelineStep>,
}

impl RouteOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware step.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.steps.push(PipelineStep::middleware(middleware));
        self
    }

    /// Appends a guard step.
    #[must_use]
    pub fn guard<G: Guard>(mut self, guard: G) -> Self {
        self.steps.push(PipelineStep::guard(guard));
        self
    }

    /// Appends an interceptor step.
    #[must_use]
    pub fn interceptor<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.steps.push(PipelineStep::interceptor(interceptor));
        self
    }

    /// Appends an already-wrapped step.
    #[must_use]
    pub fn step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Returns the steps in declaration order.
    #[must_use]
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub(crate) fn into_steps(self) -> Vec<PipelineStep> {
        self.steps
    }
}

/// A registered route: method, pattern, handler, and attached steps.
///
/// Stored in the route table at configuration time; immutable
/// afterwards.
#[derive(Clone)]
pub struct Endpoint {
    method: Method,
    pattern: String,
    handler: Arc<dyn Handler>,
    /// Group steps followed by route steps, flattened at registration.
    steps: Arc<[PipelineStep]>,
}

impl Endpoint {
    pub(crate) fn new(
        method: Method,
        pattern: impl Into<String>,
        handler: Arc<dyn Handler>,
        steps: Vec<PipelineStep>,
    ) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            handler,
            steps: steps.into(),
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the registered pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Returns the attached steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("steps", &self.steps.len())
            .finish()
    }
}
