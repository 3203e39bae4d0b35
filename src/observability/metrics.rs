//! Metrics collection and exposition.
//!
//! # Metrics
//! - `site_gate_edge_decisions_total` (counter): edge outcomes by `outcome`
//! - `site_gate_auth_checks_total` (counter): authoritative checks by `result`
//! - `site_gate_rate_limited_total` (counter): denied requests by `route`
//! - `site_gate_rate_limit_keys` (gauge): windows currently tracked, set when
//!   a window is created, reset, or swept
//! - `site_gate_upstream_requests_total` (counter): AI forwards by `route`, `status`
//! - `site_gate_upstream_duration_seconds` (histogram): AI forward latency
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_edge_decision(outcome: &'static str) {
    counter!("site_gate_edge_decisions_total", "outcome" => outcome).increment(1);
}

pub fn record_auth_check(result: &'static str) {
    counter!("site_gate_auth_checks_total", "result" => result).increment(1);
}

pub fn record_rate_limited(route: &str) {
    counter!("site_gate_rate_limited_total", "route" => route.to_string()).increment(1);
}

pub fn record_rate_limit_keys(count: usize) {
    gauge!("site_gate_rate_limit_keys").set(count as f64);
}

pub fn record_upstream(route: &str, status: u16, start: Instant) {
    counter!(
        "site_gate_upstream_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("site_gate_upstream_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}
