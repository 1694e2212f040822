//! Production metrics sink and recorder bootstrap.
//!
//! [`StatsdSink`] forwards measurements to the global `metrics` recorder,
//! so any exporter works (a statsd/Datadog bridge in production, the
//! bundled Prometheus exporter via [`init_metrics`], or none at all — the
//! macros no-op without an installed recorder).

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{Label, counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::TelemetryError;
use crate::reporter::{METRIC_DURATION, METRIC_HITS, METRIC_LATENCY, METRIC_MEMORY, StatsSink};

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Stats sink backed by the `metrics` facade.
///
/// Tags arrive as `key:value` strings and are split at the first colon
/// into metric labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsdSink;

impl StatsdSink {
    /// Creates the sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StatsSink for StatsdSink {
    fn increment(&self, metric: &str, tags: &[String]) {
        counter!(metric.to_owned(), labels(tags)).increment(1);
    }

    fn gauge(&self, metric: &str, value: f64, tags: &[String]) {
        gauge!(metric.to_owned(), labels(tags)).set(value);
    }

    fn timing(&self, metric: &str, value_ms: f64, tags: &[String]) {
        histogram!(metric.to_owned(), labels(tags)).record(value_ms);
    }
}

/// Splits `key:value` tag strings into metric labels.
///
/// A tag without a colon becomes a label with an empty value.
fn labels(tags: &[String]) -> Vec<Label> {
    tags.iter()
        .map(|tag| {
            let (key, value) = tag.split_once(':').unwrap_or((tag.as_str(), ""));
            Label::new(key.to_owned(), value.to_owned())
        })
        .collect()
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint. Calling this more than once is a no-op.
///
/// # Errors
///
/// Returns [`TelemetryError::MetricsInit`] if the recorder or HTTP
/// listener cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), TelemetryError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(METRIC_HITS, "Worker executions by action");
    describe_gauge!(METRIC_LATENCY, "Seconds between enqueue and execution start");
    describe_histogram!(METRIC_DURATION, "Worker execution duration in milliseconds");
    describe_gauge!(METRIC_MEMORY, "Worker resident set size in bytes");
}
