//! Request metrics on the `metrics` facade.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `portico_requests_total` | Counter | `route`, `status` | Total requests |
//! | `portico_request_duration_seconds` | Histogram | `route` | Request latency |
//!
//! # Example
//!
//! ```rust,no_run
//! use portico_telemetry::metrics::{init_metrics, record_request, MetricsConfig};
//! use std::time::Duration;
//!
//! init_metrics(&MetricsConfig::default()).unwrap();
//! record_request("/users/:id", 200, Duration::from_millis(45));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Global handle for rendering the Prometheus exposition.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address the exporter listens on (e.g., "0.0.0.0:9090").
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Initializes the metrics subsystem and the Prometheus exporter.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidAddress`] for a bad listener
/// address and [`TelemetryError::MetricsInit`] when the recorder
/// cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let handle = PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    describe_counter!(
        "portico_requests_total",
        "Total number of HTTP requests processed"
    );
    describe_histogram!(
        "portico_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    Ok(())
}

/// Records one completed request.
///
/// Label by the route pattern, not the raw path, to keep cardinality
/// bounded.
pub fn record_request(route: &str, status: u16, duration: Duration) {
    counter!(
        "portico_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "portico_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` when metrics were never initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
    }

    #[test]
    fn test_invalid_address_rejected() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not-an-address".to_string(),
        };
        let err = init_metrics(&config).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidAddress(_)));
    }

    #[test]
    fn test_disabled_metrics_is_a_noop() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).is_ok());
        assert!(render_metrics().is_none());
    }

    #[test]
    fn test_record_request_without_recorder_is_safe() {
        // The metrics facade drops samples when no recorder is
        // installed; recording must not panic.
        record_request("/users/:id", 200, Duration::from_millis(5));
    }
}
