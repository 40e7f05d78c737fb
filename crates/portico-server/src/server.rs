//! HTTP server implementation.
//!
//! Built on Hyper and Tokio: a TCP accept loop, one task per
//! connection, request dispatch through the [`App`], and graceful
//! shutdown draining in-flight connections.
//!
//! Two lifecycles are offered:
//!
//! - [`Server::run`] binds and serves until an OS signal arrives.
//! - [`Server::start`] resolves once the listener is bound and
//!   returns a [`ServerHandle`] whose `stop()` triggers shutdown and
//!   waits for the drain — useful for tests and embedded servers.

use std::net::SocketAddr;
use std::sync::Arc;

use http::{Request, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;

use portico_core::Response;
use portico_router::PatternError;

use crate::app::App;
use crate::config::ServerConfig;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors raised by the server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind: {0}")]
    Bind(String),

    /// Route registration failed at startup.
    #[error("route registration failed: {0}")]
    Registration(#[from] PatternError),

    /// An I/O error outside a single connection's lifecycle.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The background serve task failed.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The Portico HTTP server.
///
/// # Example
///
/// ```rust,no_run
/// use portico_server::{App, Server, ServerConfig, handler_fn};
/// use http::Method;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let app = App::builder()
///     .route(Method::GET, "/ping", handler_fn(|_req, res| {
///         Box::pin(async move {
///             res.text("pong");
///             Ok(())
///         })
///     }))
///     .build()?;
///
/// let server = Server::new(ServerConfig::default(), app);
/// server.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Server {
    config: ServerConfig,
    app: Arc<App>,
}

impl Server {
    /// Creates a server over an assembled application.
    #[must_use]
    pub fn new(config: ServerConfig, app: App) -> Self {
        Self {
            config,
            app: Arc::new(app),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the application.
    #[must_use]
    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// Runs the server until a SIGTERM or SIGINT arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the configured address
    /// cannot be bound, or an I/O error from the accept loop.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs the server with a caller-controlled shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the configured address
    /// cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        serve(listener, self.config, self.app, shutdown).await;
        Ok(())
    }

    /// Binds the listener and serves in a background task.
    ///
    /// Resolves once the listener is bound and accepting; the
    /// returned handle exposes the bound address and stops the server
    /// on demand.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the configured address
    /// cannot be bound.
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let listener = self.bind().await?;
        let addr = listener.local_addr()?;
        let shutdown = ShutdownSignal::new();

        let task = tokio::spawn(serve(
            listener,
            self.config,
            self.app,
            shutdown.clone(),
        ));

        Ok(ServerHandle {
            addr,
            shutdown,
            task,
        })
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::Bind(format!(
                "invalid address '{}': {e}",
                self.config.http_addr()
            ))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {addr}: {e}")))?;

        tracing::info!("server listening on {addr}");
        Ok(listener)
    }
}

/// A handle to a server started with [`Server::start`].
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: ShutdownSignal,
    task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Returns the bound address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the shutdown signal, e.g. to share with other tasks.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Stops the server: triggers shutdown, then waits for the
    /// accept loop and connection drain to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Join`] when the serve task panicked.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        self.task.await?;
        Ok(())
    }
}

/// The accept loop: one spawned task per connection, drained on
/// shutdown with the configured timeout.
async fn serve(
    listener: TcpListener,
    config: ServerConfig,
    app: Arc<App>,
    shutdown: ShutdownSignal,
) {
    let tracker = ConnectionTracker::new();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, remote_addr)) => {
                        let app = Arc::clone(&app);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        let request_timeout = config.request_timeout();

                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(stream, app, shutdown, request_timeout).await
                            {
                                tracing::debug!("connection error from {remote_addr}: {e}");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => {
                        tracing::error!("failed to accept connection: {e}");
                    }
                }
            }

            _ = shutdown.recv() => {
                tracing::info!("shutdown signal received, stopping server");
                break;
            }
        }
    }

    let timeout = config.shutdown_timeout();
    tracing::info!(
        "waiting up to {timeout:?} for {} connections to close",
        tracker.active_connections()
    );

    tokio::select! {
        _ = tracker.wait_for_drain() => {
            tracing::info!("all connections closed");
        }
        _ = tokio::time::sleep(timeout) => {
            tracing::warn!(
                "shutdown timeout reached, {} connections still active",
                tracker.active_connections()
            );
        }
    }

    tracing::info!("server stopped");
}

/// Serves HTTP/1.1 on a single connection.
async fn handle_connection(
    stream: tokio::net::TcpStream,
    app: Arc<App>,
    shutdown: ShutdownSignal,
    request_timeout: std::time::Duration,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: Request<Incoming>| {
        let app = Arc::clone(&app);
        async move {
            Ok::<Response, std::convert::Infallible>(
                handle_request(app, req, request_timeout).await,
            )
        }
    });

    let conn = http1::Builder::new().serve_connection(io, service);

    tokio::select! {
        result = conn => result,
        _ = shutdown.recv() => {
            tracing::debug!("connection closed due to shutdown");
            Ok(())
        }
    }
}

/// Buffers the request body (bounded by the request timeout) and
/// dispatches through the application.
async fn handle_request(
    app: Arc<App>,
    req: Request<Incoming>,
    request_timeout: std::time::Duration,
) -> Response {
    let (parts, body) = req.into_parts();

    let collected = tokio::time::timeout(request_timeout, body.collect()).await;
    let bytes = match collected {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(e)) => {
            tracing::debug!("failed to collect request body: {e}");
            return plain_error(StatusCode::BAD_REQUEST, "failed to read request body");
        }
        Err(_) => {
            tracing::debug!("request body collection timed out");
            return plain_error(StatusCode::REQUEST_TIMEOUT, "request body timed out");
        }
    };

    app.dispatch_parts(parts.method, parts.uri, parts.headers, bytes)
        .await
}

/// Builds a minimal text response for transport-level failures that
/// never reach the pipeline.
fn plain_error(status: StatusCode, message: &str) -> Response {
    let mut response = http::Response::new(http_body_util::Full::new(bytes::Bytes::from(
        message.to_string(),
    )));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::handler_fn;
    use http::Method;

    fn test_app() -> App {
        App::builder()
            .route(
                Method::GET,
                "/ping",
                handler_fn(|_req, res| {
                    Box::pin(async move {
                        res.status(StatusCode::OK).text("pong");
                        Ok(())
                    })
                }),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_binds_and_stops() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(std::time::Duration::from_secs(1))
            .build();

        let handle = Server::new(config, test_app()).start().await.unwrap();
        assert_ne!(handle.addr().port(), 0);

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_address() {
        let config = ServerConfig::builder().http_addr("nonsense").build();
        let result = Server::new(config, test_app()).start().await;

        assert!(matches!(result, Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn test_round_trip_over_tcp() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(std::time::Duration::from_secs(1))
            .build();

        let handle = Server::new(config, test_app()).start().await.unwrap();
        let addr = handle.addr();

        // Raw HTTP/1.1 request over a plain TCP socket.
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /ping HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.1 200 OK"));
        assert!(text.ends_with("pong"));

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_over_tcp() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(std::time::Duration::from_secs(1))
            .build();

        let handle = Server::new(config, test_app()).start().await.unwrap();
        let addr = handle.addr();

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /nope HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.1 404"));

        handle.stop().await.unwrap();
    }
}
