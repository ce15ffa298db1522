//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_calls_total` (counter): calls by mode and result
//! - `guard_call_duration_seconds` (histogram): latency by mode
//! - `guard_retry_attempts_total` (counter): individual retry attempts by result
//! - `guard_breaker_transitions_total` (counter): breaker transitions by target state
//! - `guard_breaker_rejections_total` (counter): calls rejected while open
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus exporter.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::BreakerState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_call(mode: &'static str, result: &str, elapsed_ms: u64) {
    counter!("guard_calls_total", "mode" => mode, "result" => result.to_string()).increment(1);
    histogram!("guard_call_duration_seconds", "mode" => mode).record(elapsed_ms as f64 / 1000.0);
}

pub fn record_retry_attempt(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("guard_retry_attempts_total", "result" => result).increment(1);
}

pub fn record_breaker_transition(circuit: &str, to: BreakerState) {
    counter!(
        "guard_breaker_transitions_total",
        "circuit" => circuit.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

pub fn record_breaker_rejection(circuit: &str) {
    counter!("guard_breaker_rejections_total", "circuit" => circuit.to_string()).increment(1);
}
