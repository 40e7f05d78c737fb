//! # Portico Core
//!
//! Core types for the Portico framework: the per-request
//! [`RequestContext`] / [`ResponseWriter`] pair, the [`HttpError`]
//! taxonomy, Problem Details bodies, and the dependency injection
//! container.
//!
//! Everything in this crate is transport-agnostic: the server crate
//! constructs contexts from hyper requests and converts sealed
//! writers back into hyper responses, while the test crate does the
//! same entirely in memory.

#![doc(html_root_url = "https://docs.rs/portico-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod body;
pub mod claims;
pub mod context;
pub mod di;
pub mod error;
pub mod problem;
pub mod query;
pub mod response;

// Re-export main types at crate root
pub use body::RequestBody;
pub use claims::UserClaims;
pub use context::{RequestContext, RequestId};
pub use di::{Container, Inject, Lifetime, ScopedContainer};
pub use error::{HttpError, HttpResult, ParameterLocation};
pub use problem::ProblemDetails;
pub use query::QueryParams;
pub use response::{Response, ResponseContent, ResponseWriter};
