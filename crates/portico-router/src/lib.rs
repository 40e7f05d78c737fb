//! # Portico Router
//!
//! Route patterns and the registration-ordered route table used by the
//! Portico request pipeline.
//!
//! Patterns consist of literal segments and named `:param` segments:
//!
//! ```rust
//! use portico_router::{PathPattern, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.insert(Method::GET, "/users/:id", "getUser");
//!
//! let matched = table.match_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(*matched.value, "getUser");
//! assert_eq!(matched.params.get("id"), Some("123"));
//! ```
//!
//! ## Resolution order
//!
//! Routes are matched in registration order and the first match wins.
//! There is no specificity ranking: when `/users/:id` is registered
//! before `/users/me`, a request for `/users/me` resolves to the
//! parameter route. Register more specific routes first. This
//! tie-break rule is a documented limitation of the table, kept
//! deliberately simple in exchange for fully predictable resolution.

#![doc(html_root_url = "https://docs.rs/portico-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod params;
pub mod pattern;
pub mod table;

pub use params::PathParams;
pub use pattern::{PathPattern, PatternError, Segment};
pub use table::{RouteMatch, RouteTable};
