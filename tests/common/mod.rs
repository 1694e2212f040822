//! Shared integration-test doubles: a capturing record log, a recording
//! stats sink, and canned memory samplers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use sidekiq_telemetry::{EventLog, EventRecord, JobDescriptor, MemorySampler, StatsSink};

/// Log double that keeps every record it is handed, in order.
#[derive(Default)]
pub struct RecordingLog(Mutex<Vec<EventRecord>>);

impl RecordingLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.0.lock().unwrap().clone()
    }
}

impl EventLog for RecordingLog {
    fn write(&self, record: &EventRecord) {
        self.0.lock().unwrap().push(record.clone());
    }
}

/// One captured metrics call.
#[derive(Debug, Clone, PartialEq)]
pub enum StatCall {
    Increment {
        metric: String,
        tags: Vec<String>,
    },
    Gauge {
        metric: String,
        value: f64,
        tags: Vec<String>,
    },
    Timing {
        metric: String,
        value_ms: f64,
        tags: Vec<String>,
    },
}

/// Stats sink double that records every call, in order.
#[derive(Default)]
pub struct RecordingSink(Mutex<Vec<StatCall>>);

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<StatCall> {
        self.0.lock().unwrap().clone()
    }

    /// Calls recorded for one metric name.
    pub fn calls_for(&self, metric: &str) -> Vec<StatCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                StatCall::Increment { metric: m, .. }
                | StatCall::Gauge { metric: m, .. }
                | StatCall::Timing { metric: m, .. } => m == metric,
            })
            .collect()
    }
}

impl StatsSink for RecordingSink {
    fn increment(&self, metric: &str, tags: &[String]) {
        self.0.lock().unwrap().push(StatCall::Increment {
            metric: metric.to_string(),
            tags: tags.to_vec(),
        });
    }

    fn gauge(&self, metric: &str, value: f64, tags: &[String]) {
        self.0.lock().unwrap().push(StatCall::Gauge {
            metric: metric.to_string(),
            value,
            tags: tags.to_vec(),
        });
    }

    fn timing(&self, metric: &str, value_ms: f64, tags: &[String]) {
        self.0.lock().unwrap().push(StatCall::Timing {
            metric: metric.to_string(),
            value_ms,
            tags: tags.to_vec(),
        });
    }
}

/// Sampler that always reports the same RSS.
pub struct FixedSampler(pub f64);

impl MemorySampler for FixedSampler {
    fn rss_bytes(&self) -> f64 {
        self.0
    }
}

/// Sampler that replays a fixed sequence of readings, then repeats the
/// last one.
pub struct SequenceSampler {
    readings: Mutex<VecDeque<f64>>,
    last: f64,
}

impl SequenceSampler {
    pub fn new(readings: &[f64]) -> Self {
        Self {
            readings: Mutex::new(readings.iter().copied().collect()),
            last: readings.last().copied().unwrap_or(-1.0),
        }
    }
}

impl MemorySampler for SequenceSampler {
    fn rss_bytes(&self) -> f64 {
        self.readings.lock().unwrap().pop_front().unwrap_or(self.last)
    }
}

/// Builds a descriptor from a raw wire payload.
pub fn descriptor(payload: Value) -> JobDescriptor {
    JobDescriptor::from_payload(payload).expect("valid job payload")
}
