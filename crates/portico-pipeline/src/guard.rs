//! Guards: allow/deny pipeline steps.
//!
//! A [`Guard`] inspects the request and decides whether the chain may
//! continue. It cannot modify the request or wrap downstream
//! processing; the adaptation in [`PipelineStep`](crate::PipelineStep)
//! writes the denial response and skips `next` when access is denied.

use http::StatusCode;
use portico_core::error::ErrorEnvelope;
use portico_core::{HttpResult, RequestContext};

use crate::middleware::BoxFuture;

/// The decision a guard resolves to before the chain continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Continue the chain.
    Allow,
    /// Deny with the default 401 response.
    Deny,
    /// Deny with an explicit status and message.
    DenyWith(Denial),
}

impl GuardOutcome {
    /// Converts a boolean predicate result into an outcome.
    #[must_use]
    pub fn allowed(allow: bool) -> Self {
        if allow {
            Self::Allow
        } else {
            Self::Deny
        }
    }
}

/// An explicit structured denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    /// The response status, typically 401 or 403.
    pub status: StatusCode,
    /// Human-readable reason sent to the client.
    pub message: String,
}

impl Denial {
    /// Creates a denial with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 401 Unauthorized denial.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden denial.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Returns the response envelope for this denial.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            status: self.status.as_u16(),
            message: self.message.clone(),
        }
    }
}

impl Default for Denial {
    fn default() -> Self {
        Self::unauthorized("Unauthorized")
    }
}

/// An allow/deny decision point in the pipeline.
pub trait Guard: Send + Sync + 'static {
    /// Returns the name of this guard, used in logs.
    fn name(&self) -> &'static str;

    /// Resolves the guard decision for a request.
    ///
    /// Returning `Err` escapes to the error handler rather than
    /// denying; use [`GuardOutcome::DenyWith`] for structured
    /// denials.
    fn check<'a>(&'a self, req: &'a RequestContext) -> BoxFuture<'a, HttpResult<GuardOutcome>>;
}

/// A guard created from an async function.
pub struct FnGuard<F> {
    name: &'static str,
    func: F,
}

impl<F> FnGuard<F>
where
    F: for<'a> Fn(&'a RequestContext) -> BoxFuture<'a, HttpResult<GuardOutcome>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based guard.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Guard for FnGuard<F>
where
    F: for<'a> Fn(&'a RequestContext) -> BoxFuture<'a, HttpResult<GuardOutcome>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn check<'a>(&'a self, req: &'a RequestContext) -> BoxFuture<'a, HttpResult<GuardOutcome>> {
        (self.func)(req)
    }
}

/// A guard created from a synchronous boolean predicate.
///
/// # Example
///
/// ```rust
/// use portico_pipeline::PredicateGuard;
/// use portico_core::RequestContext;
///
/// let guard = PredicateGuard::new("api-key", |req: &RequestContext| {
///     req.header("x-api-key") == Some("secret")
/// });
/// ```
pub struct PredicateGuard<F> {
    name: &'static str,
    func: F,
}

impl<F> PredicateGuard<F> {
    /// Creates a new predicate guard.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Guard for PredicateGuard<F>
where
    F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn check<'a>(&'a self, req: &'a RequestContext) -> BoxFuture<'a, HttpResult<GuardOutcome>> {
        let outcome = GuardOutcome::allowed((self.func)(req));
        Box::pin(async move { Ok(outcome) })
    }
}
