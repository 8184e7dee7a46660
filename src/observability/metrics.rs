//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_function_invocation_started` (counter): invocations begun, by function
//! - `gateway_function_invocation_total` (counter): completed invocations, by function and code
//! - `gateway_functions_seconds` (histogram): invocation latency, by function
//! - `gateway_scale_outcomes_total` (counter): scale gate results
//! - `gateway_scale_seconds` (histogram): time spent in the scale decision
//! - `gateway_function_cache_invalidations_total` (counter): entries dropped by control-plane requests
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_invocation_started(function: &str) {
    ::metrics::counter!("gateway_function_invocation_started", "function_name" => function.to_string())
        .increment(1);
}

pub fn record_invocation_completed(function: &str, code: u16, elapsed: Duration) {
    ::metrics::counter!(
        "gateway_function_invocation_total",
        "function_name" => function.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_functions_seconds", "function_name" => function.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_scale_outcome(outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!("gateway_scale_outcomes_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("gateway_scale_seconds", "outcome" => outcome).record(elapsed.as_secs_f64());
}

pub fn record_cache_invalidation(reason: &'static str) {
    ::metrics::counter!("gateway_function_cache_invalidations_total", "reason" => reason).increment(1);
}
