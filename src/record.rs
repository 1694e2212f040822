//! Event records: the ordered field maps logged and reported per phase.
//!
//! A tracked execution produces two records derived from the same base: a
//! start record and exactly one finish/failed record. Records are ordered
//! string→JSON maps with a single merge rule, "insert if absent", so field
//! precedence is explicit rather than an accident of map semantics.

use chrono::{DateTime, SecondsFormat};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::job::JobDescriptor;

/// Constant identifying the execution context on every record.
pub const ACTOR: &str = "sidekiq_worker";

/// Well-known record field names.
pub mod keys {
    /// Worker type name.
    pub const TAG: &str = "tag";
    /// Unique job identifier.
    pub const JOB_UUID: &str = "job_uuid";
    /// Execution-context constant.
    pub const ACTOR: &str = "actor";
    /// Queue name.
    pub const QUEUE: &str = "queue";
    /// Enqueue time, ISO-8601.
    pub const ENQUEUED_AT: &str = "enqueued_at";
    /// Creation time, ISO-8601.
    pub const CREATED_AT: &str = "created_at";
    /// Framework retry flag.
    pub const SIDEKIQ_RETRY: &str = "sidekiq_retry";
    /// Coerced retry counter, always a non-negative integer.
    pub const SIDEKIQ_RETRY_COUNT: &str = "sidekiq_retry_count";
    /// Execution phase: `start`, `finish`, or `failed`.
    pub const ACTION: &str = "action";
    /// Error message carried over from a failed attempt.
    pub const ERROR_MESSAGE: &str = "error_message";
    /// Error class carried over from a failed attempt.
    pub const ERROR_CLASS: &str = "error_class";
    /// Raw retry counter from the error payload.
    pub const RETRY_COUNT: &str = "retry_count";
    /// Elapsed wall-clock seconds.
    pub const DURATION: &str = "duration";
    /// Resident set size in bytes at sampling time.
    pub const MEMORY_RSS: &str = "memory_rss";
    /// Finish RSS minus start RSS.
    pub const MEMORY_RSS_DIFF: &str = "memory_rss_diff";
}

/// Execution phase of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The job body is about to run.
    Start,
    /// The job body returned normally.
    Finish,
    /// The job body failed (or unwound).
    Failed,
}

impl Action {
    /// The wire representation used in records and tags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Finish => "finish",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An insertion-ordered field map for one execution phase.
///
/// Serializes as a flat JSON object in insertion order. The only merge
/// operation is [`fill_missing`](Self::fill_missing): fields already set
/// are never overwritten by later defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventRecord {
    fields: IndexMap<String, Value>,
}

impl EventRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any existing value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Sets a field only if it is not already present.
    pub fn fill_missing(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Fills every field of `other` that this record does not have yet.
    pub fn merge_missing(&mut self, other: &Self) {
        for (key, value) in &other.fields {
            self.fill_missing(key.clone(), value.clone());
        }
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns a field as a string slice, if present and a string.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Returns a field as an `f64`, if present and numeric.
    #[must_use]
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// Whether the record has a field under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The record's `action` field, if set.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.str_field(keys::ACTION)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builds the phase-independent base record for one tracked execution.
///
/// Error fields are appended only when the descriptor carries a non-blank
/// error message; they then appear on both the start and finish/failed
/// records. The raw `retry_count` from the error payload sits beside the
/// always-coerced `sidekiq_retry_count`.
#[must_use]
pub fn base_record(descriptor: &JobDescriptor) -> EventRecord {
    let mut record = EventRecord::new();
    record.insert(keys::TAG, descriptor.worker_class.clone());
    record.insert(keys::JOB_UUID, descriptor.job_id.clone());
    record.insert(keys::ACTOR, ACTOR);
    record.insert(keys::QUEUE, descriptor.queue.clone());
    if let Some(at) = descriptor.enqueued_at.and_then(iso8601) {
        record.insert(keys::ENQUEUED_AT, at);
    }
    if let Some(at) = descriptor.created_at.and_then(iso8601) {
        record.insert(keys::CREATED_AT, at);
    }
    record.insert(keys::SIDEKIQ_RETRY, descriptor.retry);
    record.insert(keys::SIDEKIQ_RETRY_COUNT, descriptor.retry_count_or_zero());

    if descriptor.has_error() {
        record.insert(
            keys::ERROR_MESSAGE,
            descriptor.error_message.clone().unwrap_or_default(),
        );
        record.insert(keys::ERROR_CLASS, descriptor.error_class_string());
        record.insert(keys::RETRY_COUNT, descriptor.retry_count.clone());
    }
    record
}

/// Formats fractional epoch seconds as ISO-8601 with a trailing `Z`,
/// second precision. Returns `None` for out-of-range values.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn iso8601(epoch_seconds: f64) -> Option<String> {
    let millis = (epoch_seconds * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}
