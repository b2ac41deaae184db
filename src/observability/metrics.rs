//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_guard_requests_rejected_total` (counter): requests short-circuited
//!   by a guard, labelled by `reason`
//! - `http_guard_failures_total` (counter): failures rendered by the
//!   exception boundary, labelled by `kind` and `status`
//!
//! Recording without an installed exporter is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::FailureKind;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a request rejected before reaching the handler.
pub fn record_rejected(reason: &'static str) {
    metrics::counter!("http_guard_requests_rejected_total", "reason" => reason).increment(1);
}

/// Record a failure handled by the exception boundary.
pub fn record_failure(kind: FailureKind, status: u16) {
    metrics::counter!(
        "http_guard_failures_total",
        "kind" => kind.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
}
