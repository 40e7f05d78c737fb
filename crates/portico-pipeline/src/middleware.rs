//! Core middleware trait and the `Next` continuation.
//!
//! This module defines the [`Middleware`] trait that all middleware
//! implement, and the consuming [`Next`] continuation each step uses
//! to hand control to the rest of the chain.
//!
//! # Example
//!
//! ```rust
//! use portico_pipeline::{BoxFuture, Middleware, Next};
//! use portico_core::{HttpResult, RequestContext, ResponseWriter};
//!
//! struct TimingMiddleware;
//!
//! impl Middleware for TimingMiddleware {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         req: &'a mut RequestContext,
//!         res: &'a mut ResponseWriter,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, HttpResult<()>> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let result = next.run(req, res).await;
//!             tracing::debug!(elapsed = ?start.elapsed(), "request handled");
//!             result
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use portico_core::{HttpResult, RequestContext, ResponseWriter};

use crate::step::PipelineStep;

/// A boxed future returned by pipeline steps.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal function ending a chain.
///
/// The runner invokes this when every step has continued; in the
/// server this is the endpoint handler (or the not-found responder
/// for routing misses).
pub type Terminal = dyn for<'a> Fn(&'a mut RequestContext, &'a mut ResponseWriter) -> BoxFuture<'a, HttpResult<()>>
    + Send
    + Sync;

/// The universal pipeline unit.
///
/// Middleware receives the mutable request context, the response
/// writer, and a [`Next`] continuation. It may:
///
/// - call `next.run(...)` once to continue the chain,
/// - skip `next` and write the response to short-circuit,
/// - return `Err` to escape to the configured error handler.
///
/// Code before the `next` call runs outside-in; code after it runs
/// inside-out.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request through this middleware.
    fn handle<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseWriter,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<()>>;
}

/// Continuation for the remainder of the chain.
///
/// `run` consumes the continuation, so each step can invoke the rest
/// of the chain at most once; not invoking it short-circuits.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// Nested continuation built by the recursive strategy.
    Chain {
        step: &'a PipelineStep,
        rest: Box<Next<'a>>,
    },
    /// Cursor over the step slice used by the iterative strategy.
    Cursor {
        steps: &'a [PipelineStep],
        index: usize,
        terminal: &'a Terminal,
    },
    /// End of chain.
    Terminal(&'a Terminal),
}

impl<'a> Next<'a> {
    /// Creates a continuation that applies `step` and then `rest`.
    pub(crate) fn chain(step: &'a PipelineStep, rest: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                step,
                rest: Box::new(rest),
            },
        }
    }

    /// Creates a cursor continuation starting at the first step.
    pub(crate) fn cursor(steps: &'a [PipelineStep], terminal: &'a Terminal) -> Self {
        Self {
            inner: NextInner::Cursor {
                steps,
                index: 0,
                terminal,
            },
        }
    }

    /// Creates a terminal continuation.
    pub(crate) fn terminal(terminal: &'a Terminal) -> Self {
        Self {
            inner: NextInner::Terminal(terminal),
        }
    }

    /// Invokes the rest of the chain.
    ///
    /// Consumes `self`, so it can only be called once.
    pub async fn run(
        self,
        req: &mut RequestContext,
        res: &mut ResponseWriter,
    ) -> HttpResult<()> {
        match self.inner {
            NextInner::Chain { step, rest } => step.apply(req, res, *rest).await,
            NextInner::Cursor {
                steps,
                index,
                terminal,
            } => {
                if let Some(step) = steps.get(index) {
                    let next = Self {
                        inner: NextInner::Cursor {
                            steps,
                            index: index + 1,
                            terminal,
                        },
                    };
                    step.apply(req, res, next).await
                } else {
                    terminal(req, res).await
                }
            }
            NextInner::Terminal(terminal) => terminal(req, res).await,
        }
    }
}

/// A middleware created from a function.
///
/// Allows defining simple middleware without a dedicated type.
///
/// # Example
///
/// ```rust
/// use portico_pipeline::FnMiddleware;
///
/// let middleware = FnMiddleware::new("server-header", |req, res, next| {
///     Box::pin(async move {
///         res.header("server", "portico");
///         next.run(req, res).await
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut RequestContext,
            &'a mut ResponseWriter,
            Next<'a>,
        ) -> BoxFuture<'a, HttpResult<()>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based middleware.
    ///
    /// The bound on the constructor guides closure inference: the
    /// function must return a boxed future borrowing from its
    /// arguments.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut RequestContext,
            &'a mut ResponseWriter,
            Next<'a>,
        ) -> BoxFuture<'a, HttpResult<()>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseWriter,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<()>> {
        (self.func)(req, res, next)
    }
}
