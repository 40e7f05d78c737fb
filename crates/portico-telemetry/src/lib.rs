//! # Portico Telemetry
//!
//! Observability for Portico services: structured logging on the
//! `tracing` ecosystem and request metrics on the `metrics` facade
//! with a Prometheus exporter.
//!
//! # Example
//!
//! ```rust,no_run
//! use portico_telemetry::logging::{init_logging, LogConfig};
//! use portico_telemetry::metrics::{init_metrics, MetricsConfig};
//!
//! # fn main() -> Result<(), portico_telemetry::TelemetryError> {
//! init_logging(&LogConfig::development())?;
//! init_metrics(&MetricsConfig::default())?;
//!
//! tracing::info!(service = "orders", "service starting");
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/portico-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;

/// Result type alias using [`TelemetryError`].
pub type TelemetryResult<T> = Result<T, TelemetryError>;
