//! Request logging stage.
//!
//! Logs one structured line per request with method, path, resolved
//! status, and elapsed time. Placed first in the chain it observes
//! the full pipeline duration; placed later it times only the inner
//! steps.

use portico_core::{HttpResult, RequestContext, ResponseWriter};

use crate::middleware::{BoxFuture, Middleware, Next};

/// Middleware that logs request completion.
#[derive(Debug, Clone, Default)]
pub struct RequestLogStage;

impl RequestLogStage {
    /// Creates the logging stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for RequestLogStage {
    fn name(&self) -> &'static str {
        "request_log"
    }

    fn handle<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseWriter,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<()>> {
        Box::pin(async move {
            let start = std::time::Instant::now();
            let result = next.run(req, res).await;

            let status = res
                .status_code()
                .map_or_else(|| "-".to_string(), |s| s.as_u16().to_string());

            tracing::info!(
                request_id = %req.request_id(),
                method = %req.method(),
                path = req.path(),
                status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "request completed"
            );

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Terminal;
    use crate::step::PipelineStep;
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn test_logging_stage_passes_through() {
        let step = PipelineStep::middleware(RequestLogStage::new());
        let terminal: Box<Terminal> = Box::new(|_req, res| {
            Box::pin(async move {
                res.status(StatusCode::NO_CONTENT);
                Ok(())
            })
        });

        let mut req = RequestContext::mock(Method::DELETE, "/items/1");
        let mut res = ResponseWriter::new();
        step.apply(&mut req, &mut res, Next::terminal(terminal.as_ref()))
            .await
            .unwrap();

        assert_eq!(res.status_code(), Some(StatusCode::NO_CONTENT));
    }

    #[tokio::test]
    async fn test_logging_stage_propagates_errors() {
        let step = PipelineStep::middleware(RequestLogStage::new());
        let terminal: Box<Terminal> = Box::new(|_req, _res| {
            Box::pin(async move { Err(portico_core::HttpError::internal("boom")) })
        });

        let mut req = RequestContext::mock(Method::GET, "/fail");
        let mut res = ResponseWriter::new();
        let result = step
            .apply(&mut req, &mut res, Next::terminal(terminal.as_ref()))
            .await;

        assert!(result.is_err());
    }
}
