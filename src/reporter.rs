//! Metrics reporting for tracked job records.
//!
//! Takes a finished [`EventRecord`], derives the fixed tag triple, and
//! emits the matching measurements through an injected [`StatsSink`].
//! Reporting is side-effecting only and never fails back to the tracker:
//! the metrics transport is best-effort by contract.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::record::{EventRecord, keys};

/// Worker executions by action (counter).
pub const METRIC_HITS: &str = "sidekiq.worker.hits";
/// Seconds between enqueue and start (gauge, start only).
pub const METRIC_LATENCY: &str = "sidekiq.worker.latency";
/// Execution duration in milliseconds (timer, finish/failed only).
pub const METRIC_DURATION: &str = "sidekiq.worker.duration";
/// Resident set size in bytes (gauge, whenever memory is known).
pub const METRIC_MEMORY: &str = "sidekiq.worker.memory";

/// Actions that mark the beginning of an execution.
const START_ACTIONS: [&str; 1] = ["start"];
/// Actions that mark the end of an execution.
const FINISH_ACTIONS: [&str; 2] = ["finish", "failed"];

/// Destination for statsd-style measurements.
///
/// Implementations are shared across concurrently tracked jobs and must
/// swallow their own transport failures; all methods are infallible from
/// the reporter's point of view.
pub trait StatsSink: Send + Sync {
    /// Increments a counter by one.
    fn increment(&self, metric: &str, tags: &[String]);
    /// Sets a gauge to an absolute value.
    fn gauge(&self, metric: &str, value: f64, tags: &[String]);
    /// Records a timing sample in milliseconds.
    fn timing(&self, metric: &str, value_ms: f64, tags: &[String]);
}

/// Emits worker measurements for each record it is handed.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn StatsSink>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

impl Reporter {
    /// Creates a reporter over the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn StatsSink>) -> Self {
        Self { sink }
    }

    /// Reports one record.
    ///
    /// The four emissions are independent: the hit counter always fires,
    /// the memory gauge fires whenever `memory_rss` is set, the latency
    /// gauge only for start records with an enqueue time, and the duration
    /// timer only for finish/failed records with a duration.
    pub fn report(&self, record: &EventRecord) {
        let tags = build_tags(record);

        self.sink.increment(METRIC_HITS, &tags);

        if let Some(rss) = record.f64_field(keys::MEMORY_RSS) {
            self.sink.gauge(METRIC_MEMORY, rss, &tags);
        }

        if is_start(record) {
            if let Some(latency) = enqueue_latency(record) {
                self.sink.gauge(METRIC_LATENCY, latency, &tags);
            }
        }

        if is_finish(record) {
            if let Some(duration) = record.f64_field(keys::DURATION) {
                self.sink.timing(METRIC_DURATION, duration * 1000.0, &tags);
            }
        }
    }
}

/// Builds the tag triple for a record: `action`, `queue`, `worker_name`,
/// always three entries, in that order. Missing fields tag as empty.
#[must_use]
pub fn build_tags(record: &EventRecord) -> [String; 3] {
    [
        format!("action:{}", record.str_field(keys::ACTION).unwrap_or("")),
        format!("queue:{}", record.str_field(keys::QUEUE).unwrap_or("")),
        format!("worker_name:{}", record.str_field(keys::TAG).unwrap_or("")),
    ]
}

fn is_start(record: &EventRecord) -> bool {
    record.action().is_some_and(|a| START_ACTIONS.contains(&a))
}

fn is_finish(record: &EventRecord) -> bool {
    record.action().is_some_and(|a| FINISH_ACTIONS.contains(&a))
}

/// Seconds elapsed since the record's enqueue time.
#[allow(clippy::cast_precision_loss)]
fn enqueue_latency(record: &EventRecord) -> Option<f64> {
    let raw = record.str_field(keys::ENQUEUED_AT)?;
    let Ok(enqueued) = DateTime::parse_from_rfc3339(raw) else {
        debug!(enqueued_at = raw, "unparseable enqueue timestamp, skipping latency");
        return None;
    };
    let micros = Utc::now().timestamp_micros() - enqueued.timestamp_micros();
    Some(micros as f64 / 1_000_000.0)
}
