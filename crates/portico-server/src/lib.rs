//! # Portico Server
//!
//! The HTTP surface of the Portico framework: the [`App`] registration
//! and dispatch layer, the hyper-based [`Server`] with graceful
//! shutdown, and the [`ServerConfig`] builder.
//!
//! # Example
//!
//! ```rust,no_run
//! use portico_server::{App, Server, ServerConfig, handler_fn};
//! use http::{Method, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::builder()
//!         .route(Method::GET, "/hello/:name", handler_fn(|req, res| {
//!             Box::pin(async move {
//!                 let name = req.require_param("name")?.to_string();
//!                 res.status(StatusCode::OK).text(format!("hello, {name}"));
//!                 Ok(())
//!             })
//!         }))
//!         .build()?;
//!
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!     Server::new(config, app).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/portico-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod endpoint;
pub mod server;
pub mod shutdown;

// Re-export main types at crate root
pub use app::{App, AppBuilder, RouteGroup};
pub use config::{ConfigError, ServerConfig, ServerConfigBuilder};
pub use endpoint::{handler_fn, Endpoint, FnHandler, Handler, RouteOptions};
pub use server::{Server, ServerError, ServerHandle};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
