//! # Portico Test
//!
//! In-memory HTTP testing for Portico applications: drive an
//! [`App`](portico_server::App) through its dispatch layer without
//! binding a TCP listener.
//!
//! # Example
//!
//! ```rust
//! use portico_server::{App, handler_fn};
//! use portico_test::TestClient;
//! use http::{Method, StatusCode};
//!
//! # tokio_test::block_on(async {
//! let app = App::builder()
//!     .route(Method::GET, "/ping", handler_fn(|_req, res| {
//!         Box::pin(async move {
//!             res.status(StatusCode::OK).text("pong");
//!             Ok(())
//!         })
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let client = TestClient::new(app);
//! let response = client.get("/ping").send().await;
//! assert_eq!(response.status_code(), 200);
//! assert_eq!(response.text().unwrap(), "pong");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/portico-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod request;
pub mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
