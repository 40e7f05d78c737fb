//! Application registration and dispatch.
//!
//! [`App`] ties the route table and the pipeline together: endpoints
//! and pipeline steps are registered through [`AppBuilder`] at
//! configuration time, and [`App::dispatch`] executes one request
//! through the composed chain:
//!
//! ```text
//! global steps → group steps → route steps → handler
//! ```
//!
//! Routing misses run the global steps and then write a 404 directly,
//! without involving the error handler. Errors from any step or
//! handler escape to the configured [`ErrorHandler`].

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use http_body_util::BodyExt;

use portico_core::error::ErrorEnvelope;
use portico_core::{Container, RequestContext, Response, ResponseWriter};
use portico_pipeline::{
    ChainStrategy, DefaultErrorHandler, ErrorHandler, Guard, Interceptor, Middleware, Pipeline,
    PipelineStep, Terminal,
};
use portico_router::{PatternError, RouteTable};

use crate::endpoint::{Endpoint, Handler, RouteOptions};

/// The assembled application: routes, global steps, error handler,
/// and the dependency container.
///
/// Immutable once built; dispatch borrows it per request.
pub struct App {
    routes: RouteTable<Endpoint>,
    global: Vec<PipelineStep>,
    strategy: ChainStrategy,
    error_handler: Arc<dyn ErrorHandler>,
    container: Arc<Container>,
}

impl App {
    /// Creates a new application builder.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Returns the dependency container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Dispatches a buffered HTTP request.
    pub async fn dispatch(&self, request: http::Request<http_body_util::Full<Bytes>>) -> Response {
        let (parts, body) = request.into_parts();
        let bytes = body
            .collect()
            .await
            .map(http_body_util::Collected::to_bytes)
            .unwrap_or_default();
        self.dispatch_parts(parts.method, parts.uri, parts.headers, bytes)
            .await
    }

    /// Dispatches a request from its buffered parts.
    ///
    /// This is the transport-independent entry point used by the
    /// hyper server and the in-memory test client alike.
    pub async fn dispatch_parts(
        &self,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let mut res = ResponseWriter::new();

        // Body parsing failures flow through the error handler as a
        // 400 before any pipeline step runs.
        let mut ctx = match RequestContext::from_parts(
            method.clone(),
            uri.clone(),
            headers.clone(),
            body.clone(),
        ) {
            Ok(ctx) => ctx,
            Err(error) => {
                let ctx = RequestContext::with_raw_body(method, uri, headers, body);
                self.error_handler.handle(&ctx, &mut res, error).await;
                return self.finalize(&ctx, res).await;
            }
        };

        ctx.set_services(Arc::new(self.container.create_scope()));

        match self.routes.match_route(ctx.method(), ctx.path()) {
            Some(found) => {
                let endpoint = found.value;
                ctx.set_params(found.params);

                let steps: Vec<PipelineStep> = self
                    .global
                    .iter()
                    .chain(endpoint.steps().iter())
                    .cloned()
                    .collect();
                let pipeline = Pipeline::from_steps(steps, self.strategy);

                let handler = Arc::clone(endpoint.handler());
                let terminal: Box<Terminal> = Box::new(move |req, res| {
                    let handler = Arc::clone(&handler);
                    Box::pin(async move {
                        handler.call(req, res).await?;
                        // The terminal responder sends whatever the
                        // handler built, unless it already sent.
                        if !res.is_sent() {
                            res.send().await?;
                        }
                        Ok(())
                    })
                });

                pipeline
                    .run_with_handler(
                        &mut ctx,
                        &mut res,
                        terminal.as_ref(),
                        self.error_handler.as_ref(),
                    )
                    .await;
            }
            None => {
                // Routing miss: run the global steps, then write the
                // 404 directly. Not an error; the handler is not
                // consulted.
                let pipeline = Pipeline::from_steps(self.global.clone(), self.strategy);
                let terminal: Box<Terminal> = Box::new(|_req, res| {
                    Box::pin(async move {
                        res.status(StatusCode::NOT_FOUND);
                        if res
                            .json(&ErrorEnvelope {
                                status: 404,
                                message: "Not Found".to_string(),
                            })
                            .is_err()
                        {
                            res.text("Not Found");
                        }
                        res.send().await
                    })
                });

                pipeline
                    .run_with_handler(
                        &mut ctx,
                        &mut res,
                        terminal.as_ref(),
                        self.error_handler.as_ref(),
                    )
                    .await;
            }
        }

        self.finalize(&ctx, res).await
    }

    /// Seals the writer if nothing did, and converts it into the
    /// final response.
    async fn finalize(&self, ctx: &RequestContext, mut res: ResponseWriter) -> Response {
        if !res.is_sent() {
            if let Err(error) = res.send().await {
                self.error_handler.handle(ctx, &mut res, error).await;
                if !res.is_sent() && res.send().await.is_err() {
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        "failed to seal error response"
                    );
                }
            }
        }
        res.into_response()
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.routes.len())
            .field("global_steps", &self.global.len())
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Builder assembling an [`App`].
///
/// # Example
///
/// ```rust
/// use portico_server::{App, RouteOptions, handler_fn};
/// use portico_pipeline::PredicateGuard;
/// use portico_core::RequestContext;
/// use http::{Method, StatusCode};
///
/// let app = App::builder()
///     .route(Method::GET, "/ping", handler_fn(|_req, res| {
///         Box::pin(async move {
///             res.status(StatusCode::OK).text("pong");
///             Ok(())
///         })
///     }))
///     .route_with(
///         Method::GET,
///         "/private",
///         handler_fn(|_req, res| {
///             Box::pin(async move {
///                 res.text("secret");
///                 Ok(())
///             })
///         }),
///         RouteOptions::new().guard(PredicateGuard::new("api-key", |req: &RequestContext| {
///             req.header("x-api-key") == Some("secret")
///         })),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(app.route_count(), 2);
/// ```
pub struct AppBuilder {
    routes: RouteTable<Endpoint>,
    global: Vec<PipelineStep>,
    strategy: ChainStrategy,
    error_handler: Arc<dyn ErrorHandler>,
    container: Container,
    pattern_error: Option<PatternError>,
}

impl AppBuilder {
    /// Creates an empty builder with the default error handler and
    /// the recursive chain strategy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: RouteTable::new(),
            global: Vec::new(),
            strategy: ChainStrategy::default(),
            error_handler: Arc::new(DefaultErrorHandler),
            container: Container::new(),
            pattern_error: None,
        }
    }

    /// Sets the chain execution strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: ChainStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Appends a global middleware, run for every request.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.global.push(PipelineStep::middleware(middleware));
        self
    }

    /// Appends a global guard.
    #[must_use]
    pub fn guard<G: Guard>(mut self, guard: G) -> Self {
        self.global.push(PipelineStep::guard(guard));
        self
    }

    /// Appends a global interceptor.
    #[must_use]
    pub fn interceptor<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.global.push(PipelineStep::interceptor(interceptor));
        self
    }

    /// Replaces the error handler.
    #[must_use]
    pub fn error_handler<H: ErrorHandler>(mut self, handler: H) -> Self {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Replaces the dependency container.
    #[must_use]
    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Registers a route with no attached steps.
    #[must_use]
    pub fn route<H: Handler>(self, method: Method, pattern: &str, handler: H) -> Self {
        self.route_with(method, pattern, handler, RouteOptions::new())
    }

    /// Registers a route with attached steps.
    ///
    /// Routes resolve in registration order, first match wins;
    /// register more specific patterns before the parameter routes
    /// that would shadow them.
    #[must_use]
    pub fn route_with<H: Handler>(
        self,
        method: Method,
        pattern: &str,
        handler: H,
        options: RouteOptions,
    ) -> Self {
        self.register(method, pattern, Arc::new(handler), options.into_steps())
    }

    /// Registers a group of routes under a shared prefix and steps.
    ///
    /// Group steps run after global steps and before route steps, in
    /// declaration order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use portico_server::{App, handler_fn};
    /// use portico_pipeline::PredicateGuard;
    /// use portico_core::RequestContext;
    /// use http::Method;
    ///
    /// let app = App::builder()
    ///     .group("/admin", |group| {
    ///         group
    ///             .guard(PredicateGuard::new("admin", |req: &RequestContext| {
    ///                 req.user().is_some_and(|u| u.has_role("admin"))
    ///             }))
    ///             .route(Method::GET, "/stats", handler_fn(|_req, res| {
    ///                 Box::pin(async move {
    ///                     res.text("stats");
    ///                     Ok(())
    ///                 })
    ///             }))
    ///     })
    ///     .build()
    ///     .unwrap();
    /// ```
    #[must_use]
    pub fn group(mut self, prefix: &str, configure: impl FnOnce(RouteGroup) -> RouteGroup) -> Self {
        let group = configure(RouteGroup::new(prefix));
        let RouteGroup {
            prefix,
            steps: group_steps,
            routes,
        } = group;

        for route in routes {
            let full_pattern = format!("{prefix}{}", route.pattern);
            let mut steps = group_steps.clone();
            steps.extend(route.options.into_steps());
            self = self.register(route.method, &full_pattern, route.handler, steps);
        }
        self
    }

    fn register(
        mut self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn Handler>,
        steps: Vec<PipelineStep>,
    ) -> Self {
        if self.pattern_error.is_some() {
            return self;
        }

        let endpoint = Endpoint::new(method.clone(), pattern, handler, steps);
        if let Err(error) = self.routes.insert(method, pattern, endpoint) {
            self.pattern_error = Some(error);
        }
        self
    }

    /// Builds the application.
    ///
    /// # Errors
    ///
    /// Returns the first [`PatternError`] encountered during route
    /// registration; startup aborts rather than serving a partial
    /// route table.
    pub fn build(self) -> Result<App, PatternError> {
        if let Some(error) = self.pattern_error {
            return Err(error);
        }

        Ok(App {
            routes: self.routes,
            global: self.global,
            strategy: self.strategy,
            error_handler: self.error_handler,
            container: Arc::new(self.container),
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A group of routes sharing a path prefix and pipeline steps.
pub struct RouteGroup {
    prefix: String,
    steps: Vec<PipelineStep>,
    routes: Vec<GroupRoute>,
}

struct GroupRoute {
    method: Method,
    pattern: String,
    handler: Arc<dyn Handler>,
    options: RouteOptions,
}

impl RouteGroup {
    fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            steps: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Appends a group-level middleware.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.steps.push(PipelineStep::middleware(middleware));
        self
    }

    /// Appends a group-level guard.
    #[must_use]
    pub fn guard<G: Guard>(mut self, guard: G) -> Self {
        self.steps.push(PipelineStep::guard(guard));
        self
    }

    /// Appends a group-level interceptor.
    #[must_use]
    pub fn interceptor<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.steps.push(PipelineStep::interceptor(interceptor));
        self
    }

    /// Registers a route within the group.
    #[must_use]
    pub fn route<H: Handler>(self, method: Method, pattern: &str, handler: H) -> Self {
        self.route_with(method, pattern, handler, RouteOptions::new())
    }

    /// Registers a route within the group, with route-level steps.
    #[must_use]
    pub fn route_with<H: Handler>(
        mut self,
        method: Method,
        pattern: &str,
        handler: H,
        options: RouteOptions,
    ) -> Self {
        self.routes.push(GroupRoute {
            method,
            pattern: pattern.to_string(),
            handler: Arc::new(handler),
            options,
        });
        self
    }
}
