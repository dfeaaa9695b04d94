//! Prometheus metrics for the A/B analysis CLI.
//!
//! Exposes:
//! - `ab_decision_command_duration_seconds` (histogram)
//! - `ab_decision_command_total` (counter with status)
//! - `ab_decision_command_inflight` (gauge)
//! - `ab_decision_p_value` (gauge by metric and sample)
//! - `ab_decision_anomalous_visitors` (gauge)
//! - process metrics via `process` collector
//!
//! Runs are short-lived, so the registry is written to a file in the text
//! exposition format (node-exporter textfile collector) instead of served.

use std::fs;
use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::process_collector::ProcessCollector;
use prometheus::{
    default_registry, register_gauge_vec, register_histogram_vec, register_int_counter_vec,
    register_int_gauge, register_int_gauge_vec, Encoder, GaugeVec, HistogramVec, IntCounterVec,
    IntGauge, IntGaugeVec, TextEncoder,
};
use tracing::{info, warn};

use crate::error::{Error, Result};

static PROCESS_COLLECTOR: Lazy<()> = Lazy::new(|| {
    if let Err(err) = default_registry().register(Box::new(ProcessCollector::for_self())) {
        warn!("Failed to register process collector: {}", err);
    }
});

static COMMAND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    // Exponential buckets from 1ms up to ~16 seconds.
    let buckets =
        prometheus::exponential_buckets(0.001, 2.0, 15).expect("failed to create histogram buckets");
    register_histogram_vec!(
        "ab_decision_command_duration_seconds",
        "CLI command duration in seconds",
        &["command"],
        buckets
    )
    .expect("failed to register command duration histogram")
});

static COMMAND_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "ab_decision_command_total",
        "Total command executions by status",
        &["command", "status"]
    )
    .expect("failed to register command counter")
});

static COMMAND_INFLIGHT: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "ab_decision_command_inflight",
        "Number of in-flight commands",
        &["command"]
    )
    .expect("failed to register inflight gauge")
});

static P_VALUE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "ab_decision_p_value",
        "Last Mann-Whitney U p-value by metric and sample",
        &["metric", "sample"]
    )
    .expect("failed to register p-value gauge")
});

static ANOMALOUS_VISITORS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "ab_decision_anomalous_visitors",
        "Visitors excluded from filtered samples"
    )
    .expect("failed to register anomalous visitors gauge")
});

/// Ensure collectors are registered.
fn init_collectors() {
    Lazy::force(&PROCESS_COLLECTOR);
    Lazy::force(&COMMAND_DURATION);
    Lazy::force(&COMMAND_TOTAL);
    Lazy::force(&COMMAND_INFLIGHT);
    Lazy::force(&P_VALUE);
    Lazy::force(&ANOMALOUS_VISITORS);
}

/// Increment inflight gauge for a command.
pub fn record_command_start(command: &'static str) {
    init_collectors();
    COMMAND_INFLIGHT.with_label_values(&[command]).inc();
}

/// Record command completion with duration and status.
pub fn record_command_result(command: &'static str, duration: Duration, success: bool) {
    init_collectors();
    COMMAND_INFLIGHT.with_label_values(&[command]).dec();
    COMMAND_DURATION
        .with_label_values(&[command])
        .observe(duration.as_secs_f64());
    COMMAND_TOTAL
        .with_label_values(&[command, if success { "ok" } else { "error" }])
        .inc();
}

/// Record the p-value of one significance test.
pub fn record_p_value(metric: &str, sample: &str, p_value: f64) {
    init_collectors();
    P_VALUE.with_label_values(&[metric, sample]).set(p_value);
}

pub fn record_anomalous_visitors(count: usize) {
    init_collectors();
    ANOMALOUS_VISITORS.set(count as i64);
}

/// Encode the default registry in the text exposition format.
pub fn render() -> Result<String> {
    init_collectors();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| Error::SerializationError(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| Error::SerializationError(e.to_string()))
}

/// Write the registry to `path`, replacing it atomically via a temp file.
pub fn write_textfile(path: &Path) -> Result<()> {
    let payload = render()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("prom.tmp");
    fs::write(&tmp, payload)?;
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), "Metrics written");
    Ok(())
}
