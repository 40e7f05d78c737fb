//! Normalized chain entries.
//!
//! [`PipelineStep`] is the closed union of everything that can occupy
//! a position in the chain. Guards and interceptors are adapted here,
//! at the position they were declared: a guard that denies writes the
//! denial and never calls `next`; an interceptor runs its side effect
//! and always continues.

use std::sync::Arc;

use portico_core::{HttpResult, RequestContext, ResponseWriter};

use crate::guard::{Denial, Guard, GuardOutcome};
use crate::interceptor::Interceptor;
use crate::middleware::{BoxFuture, Middleware, Next};

/// One normalized entry in a middleware chain.
///
/// The variant is fixed at registration time; per-request execution
/// dispatches on the tag, not on runtime shape checks.
#[derive(Clone)]
pub enum PipelineStep {
    /// A plain middleware step.
    Middleware(Arc<dyn Middleware>),
    /// A guard adapted into the chain.
    Guard(Arc<dyn Guard>),
    /// An interceptor adapted into the chain.
    Interceptor(Arc<dyn Interceptor>),
}

impl PipelineStep {
    /// Wraps a middleware.
    pub fn middleware<M: Middleware>(middleware: M) -> Self {
        Self::Middleware(Arc::new(middleware))
    }

    /// Wraps a guard.
    pub fn guard<G: Guard>(guard: G) -> Self {
        Self::Guard(Arc::new(guard))
    }

    /// Wraps an interceptor.
    pub fn interceptor<I: Interceptor>(interceptor: I) -> Self {
        Self::Interceptor(Arc::new(interceptor))
    }

    /// Returns the declared name of the underlying unit.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Middleware(m) => m.name(),
            Self::Guard(g) => g.name(),
            Self::Interceptor(i) => i.name(),
        }
    }

    /// Applies this step and, unless it short-circuits, the rest of
    /// the chain.
    pub(crate) fn apply<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseWriter,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<()>> {
        Box::pin(async move {
            match self {
                Self::Middleware(middleware) => middleware.handle(req, res, next).await,
                Self::Guard(guard) => match guard.check(req).await? {
                    GuardOutcome::Allow => next.run(req, res).await,
                    GuardOutcome::Deny => {
                        write_denial(res, &Denial::default());
                        Ok(())
                    }
                    GuardOutcome::DenyWith(denial) => {
                        tracing::debug!(guard = guard.name(), status = %denial.status, "request denied");
                        write_denial(res, &denial);
                        Ok(())
                    }
                },
                Self::Interceptor(interceptor) => {
                    interceptor.apply(req).await?;
                    next.run(req, res).await
                }
            }
        })
    }
}

impl std::fmt::Debug for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Middleware(_) => "Middleware",
            Self::Guard(_) => "Guard",
            Self::Interceptor(_) => "Interceptor",
        };
        f.debug_tuple(kind).field(&self.name()).finish()
    }
}

fn write_denial(res: &mut ResponseWriter, denial: &Denial) {
    res.status(denial.status);
    if res.json(&denial.envelope()).is_err() {
        res.text(denial.message.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::PredicateGuard;
    use crate::interceptor::FnInterceptor;
    use crate::middleware::Terminal;
    use http::{Method, StatusCode};
    use portico_core::UserClaims;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_terminal(counter: Arc<AtomicUsize>) -> Box<Terminal> {
        Box::new(move |_req, res| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                res.status(StatusCode::OK).text("handled");
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn test_allowing_guard_continues() {
        let step = PipelineStep::guard(PredicateGuard::new("open", |_: &RequestContext| true));
        let counter = Arc::new(AtomicUsize::new(0));
        let terminal = counting_terminal(Arc::clone(&counter));

        let mut req = RequestContext::mock(Method::GET, "/");
        let mut res = ResponseWriter::new();
        step.apply(&mut req, &mut res, Next::terminal(terminal.as_ref()))
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(res.status_code(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn test_denying_guard_skips_terminal_with_401() {
        let step = PipelineStep::guard(PredicateGuard::new("closed", |_: &RequestContext| false));
        let counter = Arc::new(AtomicUsize::new(0));
        let terminal = counting_terminal(Arc::clone(&counter));

        let mut req = RequestContext::mock(Method::GET, "/");
        let mut res = ResponseWriter::new();
        step.apply(&mut req, &mut res, Next::terminal(terminal.as_ref()))
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(res.status_code(), Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_structured_denial_uses_its_status() {
        let step = PipelineStep::guard(crate::guard::FnGuard::new("admin", |_req| {
            Box::pin(async move {
                Ok(GuardOutcome::DenyWith(Denial::forbidden("admins only")))
            }) as BoxFuture<'_, HttpResult<GuardOutcome>>
        }));
        let counter = Arc::new(AtomicUsize::new(0));
        let terminal = counting_terminal(Arc::clone(&counter));

        let mut req = RequestContext::mock(Method::GET, "/admin");
        let mut res = ResponseWriter::new();
        step.apply(&mut req, &mut res, Next::terminal(terminal.as_ref()))
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(res.status_code(), Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_interceptor_always_continues() {
        let step = PipelineStep::interceptor(FnInterceptor::new("auth", |req: &mut RequestContext| {
            Box::pin(async move {
                req.set_user(UserClaims::new("u-9"));
                Ok(())
            }) as BoxFuture<'_, HttpResult<()>>
        }));
        let counter = Arc::new(AtomicUsize::new(0));
        let terminal = counting_terminal(Arc::clone(&counter));

        let mut req = RequestContext::mock(Method::GET, "/");
        let mut res = ResponseWriter::new();
        step.apply(&mut req, &mut res, Next::terminal(terminal.as_ref()))
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(req.user().unwrap().subject(), "u-9");
    }

    #[test]
    fn test_step_debug_includes_kind_and_name() {
        let step = PipelineStep::guard(PredicateGuard::new("api-key", |_: &RequestContext| true));
        let debug = format!("{step:?}");
        assert!(debug.contains("Guard"));
        assert!(debug.contains("api-key"));
    }
}
