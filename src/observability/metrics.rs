//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forwarder_requests_total` (counter): inbound requests by method, status, outcome
//! - `forwarder_request_duration_seconds` (histogram): handler latency by outcome
//! - `forwarder_forward_duration_seconds` (histogram): backend round trip by outcome
//! - `forwarder_log_records_total` (counter): emitted records by log type
//! - `forwarder_log_fallbacks_total` (counter): records replaced by the fallback
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording without an installed exporter is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one handled inbound request.
///
/// `outcome` is one of `ok`, `method_not_allowed`, `processing_error` or
/// `forward_error`.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "forwarder_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("forwarder_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of one backend round trip.
pub fn record_forward(outcome: &'static str, start: Instant) {
    histogram!("forwarder_forward_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_log_record(log_type: &'static str) {
    counter!("forwarder_log_records_total", "log_type" => log_type).increment(1);
}

pub fn record_log_fallback() {
    counter!("forwarder_log_fallbacks_total").increment(1);
}
