//! # Portico Pipeline
//!
//! The ordered request pipeline: middleware, guards, and interceptors
//! composed around a terminal endpoint handler, with a pluggable
//! error-handling escape path.
//!
//! ```text
//! Request → [global steps] → [group steps] → [route steps] → handler
//!                                                               ↓
//! Response ←──────────── error handler on Err ←─────────────────┘
//! ```
//!
//! ## Step kinds
//!
//! Every chain entry is one of three closed variants of
//! [`PipelineStep`]:
//!
//! | Kind | Power |
//! |------|-------|
//! | [`Middleware`] | Observe, modify, short-circuit, wrap `next` |
//! | [`Guard`] | Decide allow/deny only |
//! | [`Interceptor`] | Side effects only, always continues |
//!
//! Guards and interceptors are adapted into the chain at the position
//! they were declared, never hoisted or reordered relative to plain
//! middleware.
//!
//! ## Continuations
//!
//! [`Next`] is a consuming continuation: a step either calls
//! `next.run(...)` once or short-circuits by not calling it. A second
//! call is unrepresentable — `run` takes `self` by value.
//!
//! ## Strategies
//!
//! [`Pipeline`] executes its steps with one of two strategies that
//! produce identical side-effect ordering and identical responses:
//! [`ChainStrategy::Recursive`] builds a nested continuation per
//! request, while [`ChainStrategy::Iterative`] walks a cursor over
//! the step slice and avoids the per-step allocation, which matters
//! for deep stacks.

#![doc(html_root_url = "https://docs.rs/portico-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error_handler;
pub mod guard;
pub mod interceptor;
pub mod middleware;
pub mod runner;
pub mod stages;
pub mod step;

// Re-export main types at crate root
pub use error_handler::{DefaultErrorHandler, ErrorHandler, ProblemDetailsHandler};
pub use guard::{Denial, FnGuard, Guard, GuardOutcome, PredicateGuard};
pub use interceptor::{FnInterceptor, Interceptor};
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next, Terminal};
pub use runner::{ChainStrategy, Pipeline};
pub use step::PipelineStep;
