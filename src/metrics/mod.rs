//! Metrics module
//!
//! Prometheus counters for step and preflight outcomes. A run is short-lived,
//! so instead of serving a scrape endpoint the binary writes the text
//! exposition to a file for a textfile collector to pick up.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::path::Path;

lazy_static! {
    pub static ref STEPS_TOTAL: CounterVec = register_counter_vec!(
        "authflow_steps_total",
        "Executed lifecycle steps by outcome",
        &["step", "status"]
    ).unwrap();

    pub static ref STEP_DURATION: HistogramVec = register_histogram_vec!(
        "authflow_step_duration_seconds",
        "Lifecycle step duration in seconds",
        &["step"],
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    pub static ref PREFLIGHT_TOTAL: CounterVec = register_counter_vec!(
        "authflow_preflight_total",
        "Preflight checks by result",
        &["result"]
    ).unwrap();
}

/// Record a finished step
pub fn record_step(step: &str, status: &str, duration_secs: f64) {
    STEPS_TOTAL.with_label_values(&[step, status]).inc();
    STEP_DURATION.with_label_values(&[step]).observe(duration_secs);
}

/// Record a preflight result ("reachable", "unreachable", "unexpected_status")
pub fn record_preflight(result: &str) {
    PREFLIGHT_TOTAL.with_label_values(&[result]).inc();
}

/// Render the default registry in the Prometheus text format
pub fn gather() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Write the text exposition to `path`
pub fn write_to<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let text = gather().map_err(std::io::Error::other)?;
    std::fs::write(path, text)
}
