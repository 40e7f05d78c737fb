//! The error-handling escape path.
//!
//! Errors returned by any step or handler propagate unchanged to the
//! single outermost catch, which invokes the configured
//! [`ErrorHandler`]. Two implementations ship with the crate:
//!
//! - [`DefaultErrorHandler`] — `{status, message}` JSON envelopes,
//!   with internal details redacted.
//! - [`ProblemDetailsHandler`] — RFC 7807 bodies, optionally carrying
//!   the error's source chain for diagnostics.
//!
//! Routing misses never reach an error handler: the dispatch step
//! writes 404s directly.

use portico_core::{HttpError, ProblemDetails, RequestContext, ResponseWriter};

use crate::middleware::BoxFuture;

/// Pluggable recovery from pipeline errors.
///
/// The handler writes the failure response through the same
/// [`ResponseWriter`] the pipeline used. When the writer was already
/// sent before the error surfaced, there is nothing left to write;
/// implementations log and return.
pub trait ErrorHandler: Send + Sync + 'static {
    /// Produces the failure response for an escaped error.
    fn handle<'a>(
        &'a self,
        req: &'a RequestContext,
        res: &'a mut ResponseWriter,
        error: HttpError,
    ) -> BoxFuture<'a, ()>;
}

/// The default error handler.
///
/// Structured status-code errors keep their status and message; body
/// and parameter errors map to 400; everything else becomes a generic
/// 500 whose details go to the log, not the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl DefaultErrorHandler {
    /// Creates the default handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ErrorHandler for DefaultErrorHandler {
    fn handle<'a>(
        &'a self,
        req: &'a RequestContext,
        res: &'a mut ResponseWriter,
        error: HttpError,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            log_error(req, &error);

            if res.is_sent() {
                return;
            }

            let envelope = error.to_envelope();
            res.status(error.status_code());
            if res.json(&envelope).is_err() {
                res.text(envelope.message);
            }
        })
    }
}

/// An RFC 7807 Problem-Details error handler.
///
/// # Example
///
/// ```rust
/// use portico_pipeline::ProblemDetailsHandler;
///
/// // Production: no diagnostics in responses.
/// let handler = ProblemDetailsHandler::new();
///
/// // Development: include the error source chain.
/// let handler = ProblemDetailsHandler::new().with_diagnostics();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemDetailsHandler {
    include_diagnostics: bool,
}

impl ProblemDetailsHandler {
    /// Creates a handler that omits diagnostics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables serialization of the error source chain into an
    /// `errors` extension member.
    #[must_use]
    pub fn with_diagnostics(mut self) -> Self {
        self.include_diagnostics = true;
        self
    }

    fn problem_for(&self, req: &RequestContext, error: &HttpError) -> ProblemDetails {
        let status = error.status_code();
        let title = status
            .canonical_reason()
            .unwrap_or("Error")
            .to_string();

        let mut problem = ProblemDetails::new(status.as_u16(), title)
            .with_detail(error.public_message())
            .with_instance(req.path().to_string());

        if self.include_diagnostics {
            problem = problem.with_extension(
                "errors",
                serde_json::Value::Array(
                    error_chain(error)
                        .into_iter()
                        .map(serde_json::Value::String)
                        .collect(),
                ),
            );
        }

        problem
    }
}

impl ErrorHandler for ProblemDetailsHandler {
    fn handle<'a>(
        &'a self,
        req: &'a RequestContext,
        res: &'a mut ResponseWriter,
        error: HttpError,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            log_error(req, &error);

            if res.is_sent() {
                return;
            }

            let problem = self.problem_for(req, &error);
            res.status(error.status_code());
            if res.json(&problem).is_err() {
                res.text(problem.title);
            }
            res.header("content-type", "application/problem+json");
        })
    }
}

/// Collects the error and its source chain as display strings.
fn error_chain(error: &HttpError) -> Vec<String> {
    let mut chain = vec![error.to_string()];
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

fn log_error(req: &RequestContext, error: &HttpError) {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(
            request_id = %req.request_id(),
            method = %req.method(),
            path = req.path(),
            %error,
            "request failed"
        );
    } else {
        tracing::debug!(
            request_id = %req.request_id(),
            method = %req.method(),
            path = req.path(),
            %error,
            "request rejected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};

    async fn body_json(res: ResponseWriter) -> serde_json::Value {
        let response = res.into_response();
        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_default_handler_status_error() {
        let handler = DefaultErrorHandler::new();
        let req = RequestContext::mock(Method::GET, "/orders");
        let mut res = ResponseWriter::new();

        handler
            .handle(&req, &mut res, HttpError::bad_request("quantity must be positive"))
            .await;

        assert_eq!(res.status_code(), Some(StatusCode::BAD_REQUEST));
        let json = body_json(res).await;
        assert_eq!(json["status"], 400);
        assert_eq!(json["message"], "quantity must be positive");
    }

    #[tokio::test]
    async fn test_default_handler_redacts_internal_errors() {
        let handler = DefaultErrorHandler::new();
        let req = RequestContext::mock(Method::GET, "/orders");
        let mut res = ResponseWriter::new();

        handler
            .handle(&req, &mut res, HttpError::internal("database exploded"))
            .await;

        assert_eq!(res.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        let json = body_json(res).await;
        assert_eq!(json["message"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_default_handler_malformed_body_is_400() {
        let handler = DefaultErrorHandler::new();
        let req = RequestContext::mock(Method::POST, "/orders");
        let mut res = ResponseWriter::new();

        handler
            .handle(&req, &mut res, HttpError::malformed_body("invalid JSON"))
            .await;

        assert_eq!(res.status_code(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_default_handler_skips_sent_writer() {
        let handler = DefaultErrorHandler::new();
        let req = RequestContext::mock(Method::GET, "/");
        let mut res = ResponseWriter::new();
        res.status(StatusCode::OK).text("done");
        res.send().await.unwrap();

        handler
            .handle(&req, &mut res, HttpError::internal("late failure"))
            .await;

        // The sealed 200 response is untouched.
        assert_eq!(res.status_code(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn test_problem_details_shape() {
        let handler = ProblemDetailsHandler::new();
        let req = RequestContext::mock(Method::GET, "/users/42");
        let mut res = ResponseWriter::new();

        handler
            .handle(&req, &mut res, HttpError::not_found("no such user"))
            .await;

        assert_eq!(res.status_code(), Some(StatusCode::NOT_FOUND));
        let json = body_json(res).await;
        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["title"], "Not Found");
        assert_eq!(json["status"], 404);
        assert_eq!(json["detail"], "no such user");
        assert_eq!(json["instance"], "/users/42");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_problem_details_diagnostics_chain() {
        let handler = ProblemDetailsHandler::new().with_diagnostics();
        let req = RequestContext::mock(Method::GET, "/");
        let mut res = ResponseWriter::new();

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let error = HttpError::internal_with_source("upstream call failed", io);

        handler.handle(&req, &mut res, error).await;

        let json = body_json(res).await;
        let errors = json["errors"].as_array().unwrap();
        assert!(errors[0].as_str().unwrap().contains("upstream call failed"));
        assert!(errors
            .iter()
            .any(|e| e.as_str().unwrap().contains("connection reset")));
    }

    #[tokio::test]
    async fn test_problem_details_content_type() {
        let handler = ProblemDetailsHandler::new();
        let req = RequestContext::mock(Method::GET, "/");
        let mut res = ResponseWriter::new();

        handler
            .handle(&req, &mut res, HttpError::forbidden("nope"))
            .await;
        res.send().await.unwrap();

        let response = res.into_response();
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }
}
