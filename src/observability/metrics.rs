//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by verdict
//! - `gate_rejections_total` (counter): 403/429 by reason
//! - `gate_refresh_total` (counter): refresh exchanges by outcome
//! - `gate_limiter_warnings_total` (counter): near-limit warnings, one per key per window
//! - `gate_limiter_keys` (gauge): distinct keys after the last sweep
//! - `gate_request_duration_seconds` (histogram): end-to-end latency
//!
//! Without an installed recorder every call is a no-op, so tests and the
//! CLI never need to set one up.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(verdict: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "gate_requests_total",
        "verdict" => verdict,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gate_request_duration_seconds", "verdict" => verdict)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    metrics::counter!("gate_rejections_total", "reason" => reason).increment(1);
}

pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("gate_refresh_total", "outcome" => outcome).increment(1);
}

pub fn record_limiter_warning() {
    metrics::counter!("gate_limiter_warnings_total").increment(1);
}

pub fn set_limiter_keys(count: usize) {
    metrics::gauge!("gate_limiter_keys").set(count as f64);
}
