//! # Portico
//!
//! **Async HTTP server framework built around an explicit request
//! pipeline**
//!
//! Portico composes middleware, guards, and interceptors around a
//! terminal endpoint handler, with a pluggable error-handling escape
//! path:
//!
//! ```text
//! Request → global steps → group steps → route steps → handler
//!                                                         ↓
//! Response ←──────────── error handler on Err ←───────────┘
//! ```
//!
//! - **Explicit registration** – routes and pipeline steps are plain
//!   builder calls; no reflection, no attribute metadata.
//! - **Closed step variants** – every chain entry is a middleware, a
//!   guard, or an interceptor, fixed at registration time.
//! - **Send-once responses** – the response writer seals exactly
//!   once; double sends fail loudly.
//! - **Scoped dependency injection** – transient, singleton, and
//!   request-scoped lifetimes on an explicitly threaded container.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portico::prelude::*;
//! use http::{Method, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::builder()
//!         .middleware(RequestLogStage::new())
//!         .route(Method::GET, "/users/:id", handler_fn(|req, res| {
//!             Box::pin(async move {
//!                 let id = req.require_param("id")?.to_string();
//!                 res.status(StatusCode::OK).json(&serde_json::json!({"id": id}))?;
//!                 Ok(())
//!             })
//!         }))
//!         .build()?;
//!
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     Server::new(config, app).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/portico/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use portico_core as core;

// Re-export router types
pub use portico_router as router;

// Re-export pipeline types
pub use portico_pipeline as pipeline;

// Re-export server types
pub use portico_server as server;

// Re-export telemetry types
pub use portico_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use portico::prelude::*;
/// ```
pub mod prelude {
    pub use portico_core::{
        HttpError, HttpResult, ProblemDetails, RequestBody, RequestContext, RequestId, Response,
        ResponseWriter, UserClaims,
    };

    // Re-export DI types
    pub use portico_core::di::{Container, Inject, Lifetime, ScopedContainer};

    // Re-export pipeline types
    pub use portico_pipeline::{
        BoxFuture, ChainStrategy, DefaultErrorHandler, Denial, ErrorHandler, FnGuard,
        FnInterceptor, FnMiddleware, Guard, GuardOutcome, Interceptor, Middleware, Next, Pipeline,
        PipelineStep, PredicateGuard, ProblemDetailsHandler, Terminal,
    };

    // Re-export built-in stages
    pub use portico_pipeline::stages::{RequestIdStage, RequestLogStage};

    // Re-export server types
    pub use portico_server::{
        handler_fn, App, AppBuilder, Handler, RouteGroup, RouteOptions, Server, ServerConfig,
        ServerHandle, ShutdownSignal,
    };

    // Re-export telemetry init helpers
    pub use portico_telemetry::logging::{init_logging, LogConfig};
    pub use portico_telemetry::metrics::{init_metrics, MetricsConfig};
}
