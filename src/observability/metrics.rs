//! Metrics collection and exposition.
//!
//! # Metrics
//! - `switchyard_requests_total` (counter): requests by method, status
//! - `switchyard_request_duration_seconds` (histogram): chain latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed, so tests and embedders pay nothing
//! - Prometheus exposition on its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter serving `/metrics` on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(
        "switchyard_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "switchyard_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed);
}
