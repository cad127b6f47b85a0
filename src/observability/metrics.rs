//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_proxy_fetch_total` (counter): kite fetches by outcome
//! - `gateway_logins_total` (counter): login attempts by outcome
//! - `gateway_webhook_events_total` (counter): webhook events by name
//! - `gateway_registered_kites` (gauge): current kite registrations
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_proxy_fetch(outcome: &'static str) {
    counter!("gateway_proxy_fetch_total", "outcome" => outcome).increment(1);
}

pub fn record_login(outcome: &'static str) {
    counter!("gateway_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_webhook_event(name: &'static str) {
    counter!("gateway_webhook_events_total", "name" => name).increment(1);
}

pub fn record_registered_kites(count: usize) {
    gauge!("gateway_registered_kites").set(count as f64);
}
