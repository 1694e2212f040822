//! Job descriptor supplied by the execution framework.
//!
//! A [`JobDescriptor`] is a read-only view of the job hash the framework
//! hands to server middleware. Field names follow the Sidekiq wire format
//! so a descriptor deserializes directly from the raw job payload.

use serde::Deserialize;
use serde_json::Value;

use crate::record::EventRecord;

/// Metadata describing one unit of background work.
///
/// Immutable input to a single tracked execution. Timestamps are epoch
/// seconds (fractional). `retry_count` is kept as a raw JSON value because
/// frameworks put non-integers there in practice; use
/// [`retry_count_or_zero`](Self::retry_count_or_zero) for the coerced form.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDescriptor {
    /// Worker type name (e.g. `"Articles::UpdateAnalyticsWorker"`).
    #[serde(rename = "class")]
    pub worker_class: String,

    /// Unique job identifier.
    #[serde(rename = "jid", default)]
    pub job_id: String,

    /// Queue the job was pulled from.
    #[serde(default = "default_queue")]
    pub queue: String,

    /// Opaque argument payload.
    #[serde(default)]
    pub args: Value,

    /// When the job was pushed onto the queue, epoch seconds.
    #[serde(default)]
    pub enqueued_at: Option<f64>,

    /// When the job was first created, epoch seconds.
    #[serde(default)]
    pub created_at: Option<f64>,

    /// Whether the framework will retry this job on failure.
    #[serde(default)]
    pub retry: bool,

    /// Raw retry counter. May be absent or a non-integer.
    #[serde(default)]
    pub retry_count: Value,

    /// Error message from a previous failed attempt, if any.
    #[serde(default)]
    pub error_message: Option<String>,

    /// Error class from a previous failed attempt. Stringified on use.
    #[serde(default)]
    pub error_class: Option<Value>,
}

fn default_queue() -> String {
    "default".to_string()
}

impl JobDescriptor {
    /// Parses a descriptor from the framework's raw job payload.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the payload lacks a `class` field or a
    /// field has an incompatible type.
    pub fn from_payload(payload: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload)
    }

    /// Retry count as a non-negative integer, `0` when the raw value is
    /// anything else (absent, negative, string, float).
    #[must_use]
    pub fn retry_count_or_zero(&self) -> u64 {
        self.retry_count.as_u64().unwrap_or(0)
    }

    /// Whether the descriptor carries error metadata worth recording.
    ///
    /// A missing or whitespace-only `error_message` counts as absent.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error_message
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty())
    }

    /// `error_class` rendered as a string (`""` when absent).
    #[must_use]
    pub fn error_class_string(&self) -> String {
        match &self.error_class {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Worker-specific argument description, pluggable per framework.
///
/// Some workers expose a richer argument hash than the raw positional
/// `args` payload. The framework may provide an implementation; fields it
/// returns are merged into the base record without overwriting anything
/// the core already set.
pub trait ArgsDescriber: Send + Sync {
    /// Extra record fields describing this job's arguments, or `None`
    /// when the describer has nothing to add.
    fn describe(&self, descriptor: &JobDescriptor) -> Option<EventRecord>;
}

/// Fallback describer: contributes the raw argument payload as `job_args`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobArgsDescriber;

impl ArgsDescriber for JobArgsDescriber {
    fn describe(&self, descriptor: &JobDescriptor) -> Option<EventRecord> {
        if descriptor.args.is_null() {
            return None;
        }
        let mut extra = EventRecord::new();
        extra.insert("job_args", descriptor.args.clone());
        Some(extra)
    }
}
