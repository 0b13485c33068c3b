//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, status, class
//! - `edge_upstream_latency_seconds` (histogram): time until upstream headers
//! - `edge_auth_rejections_total` (counter): requests stopped by the auth gate
//! - `edge_upstream_errors_total` (counter): forwarding failures by kind
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, class: &'static str, start: Instant) {
    ::metrics::counter!(
        "edge_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "class" => class
    )
    .increment(1);
    ::metrics::histogram!("edge_request_duration_seconds", "class" => class)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_latency(class: &'static str, start: Instant) {
    ::metrics::histogram!("edge_upstream_latency_seconds", "class" => class)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_auth_rejection() {
    ::metrics::counter!("edge_auth_rejections_total").increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    ::metrics::counter!("edge_upstream_errors_total", "kind" => kind).increment(1);
}
