//! Interceptors: side-effect-only pipeline steps.
//!
//! An [`Interceptor`] observes and enriches the request — the
//! canonical example is an authentication interceptor populating
//! [`UserClaims`](portico_core::UserClaims) — but cannot write the
//! response or deny access. After it runs, the chain always
//! continues.

use portico_core::{HttpResult, RequestContext};

use crate::middleware::BoxFuture;

/// A side-effecting observer adapted into the chain.
///
/// Returning `Err` escapes to the error handler; an interceptor that
/// completes successfully always continues the chain.
pub trait Interceptor: Send + Sync + 'static {
    /// Returns the name of this interceptor, used in logs.
    fn name(&self) -> &'static str;

    /// Runs the interceptor's side effects against the request.
    fn apply<'a>(&'a self, req: &'a mut RequestContext) -> BoxFuture<'a, HttpResult<()>>;
}

/// An interceptor created from a function.
///
/// # Example
///
/// ```rust
/// use portico_pipeline::FnInterceptor;
/// use portico_core::UserClaims;
///
/// let auth = FnInterceptor::new("auth", |req| {
///     Box::pin(async move {
///         if let Some(token) = req.header("x-user") {
///             let claims = UserClaims::new(token.to_string());
///             req.set_user(claims);
///         }
///         Ok(())
///     })
/// });
/// ```
pub struct FnInterceptor<F> {
    name: &'static str,
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, HttpResult<()>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based interceptor.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, HttpResult<()>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply<'a>(&'a self, req: &'a mut RequestContext) -> BoxFuture<'a, HttpResult<()>> {
        (self.func)(req)
    }
}
