//! Request ID propagation stage.
//!
//! Ensures every request carries a correlation ID: either the
//! client-supplied `x-request-id` header (when trusted) or the UUID v7
//! the context was created with. The resolved ID is echoed on the
//! response so clients can correlate their requests with server logs.

use portico_core::{HttpResult, RequestContext, RequestId, ResponseWriter};
use uuid::Uuid;

use crate::middleware::{BoxFuture, Middleware, Next};

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that propagates or keeps request IDs.
///
/// # Behavior
///
/// 1. When trusting incoming headers, a valid UUID in `x-request-id`
///    replaces the generated context ID.
/// 2. The resolved ID is set as the `x-request-id` response header.
///
/// Incoming IDs are not trusted by default; enable trust only for
/// internal service-to-service traffic.
#[derive(Debug, Clone, Default)]
pub struct RequestIdStage {
    trust_incoming: bool,
}

impl RequestIdStage {
    /// Creates a stage that always keeps the generated ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stage that trusts incoming `x-request-id` headers.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    fn extract_request_id(&self, req: &RequestContext) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        req.header(REQUEST_ID_HEADER)
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(RequestId::from_uuid)
    }
}

impl Middleware for RequestIdStage {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn handle<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseWriter,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<()>> {
        Box::pin(async move {
            if let Some(request_id) = self.extract_request_id(req) {
                req.set_request_id(request_id);
            }

            let request_id = req.request_id();
            res.header(REQUEST_ID_HEADER, request_id.to_string());

            next.run(req, res).await
        })
    }
}
