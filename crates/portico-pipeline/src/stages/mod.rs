//! Built-in pipeline stages.
//!
//! These ship with the framework but are ordinary [`Middleware`]
//! implementations: register them like user middleware, at whatever
//! position fits. They are never hoisted or privileged.
//!
//! [`Middleware`]: crate::Middleware

pub mod logging;
pub mod request_id;

pub use logging::RequestLogStage;
pub use request_id::RequestIdStage;
