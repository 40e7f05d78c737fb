//! End-to-end pipeline integration tests.
//!
//! These tests verify the chain contract across step kinds and both
//! execution strategies: registration-order execution, wrap ordering
//! around `next`, guard adaptation, interceptor adaptation, and the
//! error escape path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use portico_core::{HttpError, HttpResult, RequestContext, ResponseWriter, UserClaims};
use portico_pipeline::{
    BoxFuture, ChainStrategy, DefaultErrorHandler, ErrorHandler, FnGuard, FnInterceptor,
    FnMiddleware, GuardOutcome, Next, Pipeline, PipelineStep, PredicateGuard, Terminal,
};

type Log = Arc<Mutex<Vec<String>>>;

/// A middleware that records entries before and after its `next` call.
fn wrapping_step(tag: &'static str, log: Log) -> PipelineStep {
    PipelineStep::middleware(FnMiddleware::new(
        tag,
        move |req: &mut RequestContext, res: &mut ResponseWriter, next: Next<'_>| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().unwrap().push(format!("before:{tag}"));
                let result = next.run(req, res).await;
                log.lock().unwrap().push(format!("after:{tag}"));
                result
            }) as BoxFuture<'_, HttpResult<()>>
        },
    ))
}

fn ok_terminal(log: Log) -> Box<Terminal> {
    Box::new(move |_req, res| {
        let log = Arc::clone(&log);
        Box::pin(async move {
            log.lock().unwrap().push("handler".to_string());
            res.status(StatusCode::OK).text("handled");
            res.send().await
        })
    })
}

fn request(method: Method, uri: &str) -> RequestContext {
    RequestContext::mock(method, uri)
}

fn request_with_header(uri: &str, name: &str, value: &str) -> RequestContext {
    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
        value.parse().unwrap(),
    );
    RequestContext::from_parts(Method::GET, uri.parse().unwrap(), headers, Bytes::new()).unwrap()
}

/// An error handler that counts invocations, for spy-based assertions.
#[derive(Clone, Default)]
struct SpyErrorHandler {
    calls: Arc<AtomicUsize>,
}

impl ErrorHandler for SpyErrorHandler {
    fn handle<'a>(
        &'a self,
        _req: &'a RequestContext,
        res: &'a mut ResponseWriter,
        error: HttpError,
    ) -> BoxFuture<'a, ()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            res.status(error.status_code()).json(&error.to_envelope()).ok();
        })
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_before_and_after_ordering() {
    for strategy in [ChainStrategy::Recursive, ChainStrategy::Iterative] {
        let log: Log = Arc::default();
        let pipeline = Pipeline::new(strategy)
            .with_step(wrapping_step("1", Arc::clone(&log)))
            .with_step(wrapping_step("2", Arc::clone(&log)))
            .with_step(wrapping_step("3", Arc::clone(&log)));

        let terminal = ok_terminal(Arc::clone(&log));
        let mut req = request(Method::GET, "/");
        let mut res = ResponseWriter::new();
        pipeline
            .run(&mut req, &mut res, terminal.as_ref())
            .await
            .unwrap();

        let entries = log.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec![
                "before:1", "before:2", "before:3", "handler", "after:3", "after:2", "after:1",
            ],
            "wrap order must hold under {strategy:?}"
        );
    }
}

#[tokio::test]
async fn test_strategies_produce_identical_results() {
    // Run the same chain under both strategies and compare the logs
    // and the final responses.
    let mut outputs = Vec::new();

    for strategy in [ChainStrategy::Recursive, ChainStrategy::Iterative] {
        let log: Log = Arc::default();
        let pipeline = Pipeline::new(strategy)
            .with_step(wrapping_step("outer", Arc::clone(&log)))
            .with_step(PipelineStep::guard(PredicateGuard::new("open", |_: &RequestContext| true)))
            .with_step(wrapping_step("inner", Arc::clone(&log)));

        let terminal = ok_terminal(Arc::clone(&log));
        let mut req = request(Method::GET, "/compare");
        let mut res = ResponseWriter::new();
        pipeline
            .run(&mut req, &mut res, terminal.as_ref())
            .await
            .unwrap();

        let response = res.into_response();
        let status = response.status();
        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();

        outputs.push((log.lock().unwrap().clone(), status, body));
    }

    assert_eq!(outputs[0], outputs[1]);
}

#[tokio::test]
async fn test_guards_and_interceptors_run_at_declared_position() {
    let log: Log = Arc::default();

    let observer = {
        let log = Arc::clone(&log);
        PipelineStep::interceptor(FnInterceptor::new(
            "observer",
            move |_req: &mut RequestContext| {
                let log = Arc::clone(&log);
                Box::pin(async move {
                    log.lock().unwrap().push("interceptor".to_string());
                    Ok(())
                }) as BoxFuture<'_, HttpResult<()>>
            },
        ))
    };

    let gate = {
        let log = Arc::clone(&log);
        PipelineStep::guard(FnGuard::new("gate", move |_req: &RequestContext| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().unwrap().push("guard".to_string());
                Ok(GuardOutcome::Allow)
            }) as BoxFuture<'_, HttpResult<GuardOutcome>>
        }))
    };

    let pipeline = Pipeline::new(ChainStrategy::Recursive)
        .with_step(wrapping_step("mw", Arc::clone(&log)))
        .with_step(observer)
        .with_step(gate);

    let terminal = ok_terminal(Arc::clone(&log));
    let mut req = request(Method::GET, "/");
    let mut res = ResponseWriter::new();
    pipeline
        .run(&mut req, &mut res, terminal.as_ref())
        .await
        .unwrap();

    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["before:mw", "interceptor", "guard", "handler", "after:mw"]
    );
}

// ============================================================================
// Guards
// ============================================================================

#[tokio::test]
async fn test_api_key_guard_denies_without_header() {
    let pipeline = Pipeline::default().with_guard(PredicateGuard::new("api-key", |req: &RequestContext| {
        req.header("x-api-key") == Some("secret")
    }));

    let handler_calls = Arc::new(AtomicUsize::new(0));
    let terminal: Box<Terminal> = {
        let handler_calls = Arc::clone(&handler_calls);
        Box::new(move |_req, res| {
            let handler_calls = Arc::clone(&handler_calls);
            Box::pin(async move {
                handler_calls.fetch_add(1, Ordering::SeqCst);
                res.status(StatusCode::OK).text("ok");
                Ok(())
            })
        })
    };

    // Without the header: 401, handler never invoked.
    let mut req = request(Method::GET, "/guarded");
    let mut res = ResponseWriter::new();
    pipeline
        .run(&mut req, &mut res, terminal.as_ref())
        .await
        .unwrap();
    assert_eq!(res.status_code(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);

    // With the header: 200.
    let mut req = request_with_header("/guarded", "x-api-key", "secret");
    let mut res = ResponseWriter::new();
    pipeline
        .run(&mut req, &mut res, terminal.as_ref())
        .await
        .unwrap();
    assert_eq!(res.status_code(), Some(StatusCode::OK));
    assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_role_guard_reads_interceptor_claims() {
    // An auth interceptor populates claims from a header; a role
    // guard declared after it decides on those claims.
    let auth = FnInterceptor::new("auth", |req: &mut RequestContext| {
        Box::pin(async move {
            if let Some(subject) = req.header("x-user") {
                let claims = UserClaims::new(subject.to_string())
                    .with_claim("roles", serde_json::json!(["admin"]));
                req.set_user(claims);
            }
            Ok(())
        }) as BoxFuture<'_, HttpResult<()>>
    });

    let admin_only = FnGuard::new("admin", |req: &RequestContext| {
        let outcome = GuardOutcome::allowed(req.user().is_some_and(|u| u.has_role("admin")));
        Box::pin(async move { Ok(outcome) }) as BoxFuture<'_, HttpResult<GuardOutcome>>
    });

    let pipeline = Pipeline::default()
        .with_interceptor(auth)
        .with_guard(admin_only);

    let log: Log = Arc::default();
    let terminal = ok_terminal(Arc::clone(&log));

    let mut req = request_with_header("/admin", "x-user", "alice");
    let mut res = ResponseWriter::new();
    pipeline
        .run(&mut req, &mut res, terminal.as_ref())
        .await
        .unwrap();
    assert_eq!(res.status_code(), Some(StatusCode::OK));

    let mut req = request(Method::GET, "/admin");
    let mut res = ResponseWriter::new();
    pipeline
        .run(&mut req, &mut res, terminal.as_ref())
        .await
        .unwrap();
    assert_eq!(res.status_code(), Some(StatusCode::UNAUTHORIZED));
}

// ============================================================================
// Interceptors
// ============================================================================

#[tokio::test]
async fn test_interceptor_cannot_prevent_handler() {
    // Whatever the interceptor observes, the handler runs exactly once.
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::default().with_interceptor(FnInterceptor::new(
        "noop",
        |_req: &mut RequestContext| {
            Box::pin(async move { Ok(()) }) as BoxFuture<'_, HttpResult<()>>
        },
    ));

    let terminal: Box<Terminal> = {
        let handler_calls = Arc::clone(&handler_calls);
        Box::new(move |_req, res| {
            let handler_calls = Arc::clone(&handler_calls);
            Box::pin(async move {
                handler_calls.fetch_add(1, Ordering::SeqCst);
                res.status(StatusCode::OK);
                Ok(())
            })
        })
    };

    let mut req = request(Method::GET, "/");
    let mut res = ResponseWriter::new();
    pipeline
        .run(&mut req, &mut res, terminal.as_ref())
        .await
        .unwrap();

    assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Error escape path
// ============================================================================

#[tokio::test]
async fn test_status_error_recovered_into_envelope() {
    let pipeline = Pipeline::default();
    let terminal: Box<Terminal> = Box::new(|_req, _res| {
        Box::pin(async move {
            Err(HttpError::status(
                StatusCode::BAD_REQUEST,
                "quantity must be positive",
            ))
        })
    });

    let mut req = request(Method::POST, "/orders");
    let mut res = ResponseWriter::new();
    pipeline
        .run_with_handler(&mut req, &mut res, terminal.as_ref(), &DefaultErrorHandler)
        .await;

    assert_eq!(res.status_code(), Some(StatusCode::BAD_REQUEST));
    let response = res.into_response();
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], 400);
    assert_eq!(json["message"], "quantity must be positive");
}

#[tokio::test]
async fn test_unexpected_error_becomes_500() {
    let pipeline = Pipeline::default();
    let terminal: Box<Terminal> = Box::new(|_req, _res| {
        Box::pin(async move { Err(HttpError::internal("secret detail")) })
    });

    let mut req = request(Method::GET, "/");
    let mut res = ResponseWriter::new();
    pipeline
        .run_with_handler(&mut req, &mut res, terminal.as_ref(), &DefaultErrorHandler)
        .await;

    assert_eq!(res.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    let response = res.into_response();
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    assert!(!String::from_utf8_lossy(&bytes).contains("secret detail"));
}

#[tokio::test]
async fn test_middleware_error_skips_downstream_and_reaches_handler_once() {
    let spy = SpyErrorHandler::default();
    let handler_calls = Arc::new(AtomicUsize::new(0));

    let pipeline = Pipeline::default().with_middleware(FnMiddleware::new(
        "failing",
        |_req: &mut RequestContext, _res: &mut ResponseWriter, _next: Next<'_>| {
            Box::pin(async move { Err(HttpError::conflict("already exists")) })
                as BoxFuture<'_, HttpResult<()>>
        },
    ));

    let terminal: Box<Terminal> = {
        let handler_calls = Arc::clone(&handler_calls);
        Box::new(move |_req, res| {
            let handler_calls = Arc::clone(&handler_calls);
            Box::pin(async move {
                handler_calls.fetch_add(1, Ordering::SeqCst);
                res.status(StatusCode::OK);
                Ok(())
            })
        })
    };

    let mut req = request(Method::POST, "/items");
    let mut res = ResponseWriter::new();
    pipeline
        .run_with_handler(&mut req, &mut res, terminal.as_ref(), &spy)
        .await;

    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    assert_eq!(res.status_code(), Some(StatusCode::CONFLICT));
}

#[tokio::test]
async fn test_guard_denial_is_not_an_error() {
    // Guard denials write the response directly; the error handler
    // must never observe them.
    let spy = SpyErrorHandler::default();
    let pipeline = Pipeline::default().with_guard(PredicateGuard::new("closed", |_: &RequestContext| false));

    let log: Log = Arc::default();
    let terminal = ok_terminal(Arc::clone(&log));

    let mut req = request(Method::GET, "/");
    let mut res = ResponseWriter::new();
    pipeline
        .run_with_handler(&mut req, &mut res, terminal.as_ref(), &spy)
        .await;

    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    assert_eq!(res.status_code(), Some(StatusCode::UNAUTHORIZED));
}

// ============================================================================
// Send-once invariant
// ============================================================================

#[tokio::test]
async fn test_double_send_fails_deterministically() {
    let pipeline = Pipeline::default();
    let terminal: Box<Terminal> = Box::new(|_req, res| {
        Box::pin(async move {
            res.status(StatusCode::OK).text("first");
            res.send().await?;
            // The second send must fail, and the failure escapes.
            res.send().await
        })
    });

    let mut req = request(Method::GET, "/");
    let mut res = ResponseWriter::new();
    let err = pipeline
        .run(&mut req, &mut res, terminal.as_ref())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::ResponseAlreadySent));
    // The first response is intact.
    assert_eq!(res.status_code(), Some(StatusCode::OK));
}
