//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatcher_requests_total` (counter): completed calls by method, status
//! - `dispatcher_request_duration_seconds` (histogram): call latency by method
//! - `dispatcher_rate_limited_total` (counter): 429s by scope (bucket/global/unproxied)
//! - `dispatcher_retries_total` (counter): consumed retries by reason
//! - `dispatcher_deferred_unlocks_total` (counter): exhausted buckets held on a timer
//! - `dispatcher_buckets` (gauge): distinct buckets seen

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "dispatcher_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("dispatcher_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(scope: &'static str) {
    counter!("dispatcher_rate_limited_total", "scope" => scope).increment(1);
}

pub fn record_retry(reason: &'static str) {
    counter!("dispatcher_retries_total", "reason" => reason).increment(1);
}

pub fn record_deferred_unlock() {
    counter!("dispatcher_deferred_unlocks_total").increment(1);
}

pub fn record_bucket_count(count: usize) {
    gauge!("dispatcher_buckets").set(count as f64);
}
