//! `sidekiq-telemetry` - Job lifecycle telemetry for background workers
//!
//! Wraps the execution of Sidekiq-compatible background jobs to capture
//! start/finish/failure events, elapsed duration, process memory footprint,
//! and per-job metadata, emitting each record to a structured log and a
//! statsd-style metrics collector.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sidekiq_telemetry::{
//!     JobDescriptor, ProcStatusSampler, Reporter, StatsdSink, Tracker, TracingLog,
//! };
//!
//! let tracker = Tracker::new(
//!     Arc::new(TracingLog::new()),
//!     Reporter::new(Arc::new(StatsdSink::new())),
//!     Arc::new(ProcStatusSampler::new()),
//! );
//!
//! let descriptor = JobDescriptor::from_payload(serde_json::json!({
//!     "class": "Articles::UpdateAnalyticsWorker",
//!     "jid": "8c9e2f50a1b3",
//!     "queue": "low_priority",
//!     "enqueued_at": 1735689600.0,
//!     "retry": true,
//! }))?;
//!
//! let outcome: Result<(), std::io::Error> = tracker.track(&descriptor, || {
//!     // run the job body
//!     Ok(())
//! });
//! # outcome.unwrap();
//! # Ok::<(), serde_json::Error>(())
//! ```

pub mod error;
pub mod job;
pub mod log;
pub mod record;
pub mod reporter;
pub mod sampler;
pub mod statsd;
pub mod tracker;

pub use error::{Result, TelemetryError};
pub use job::{ArgsDescriber, JobArgsDescriber, JobDescriptor};
pub use log::{EventLog, JsonLinesLog, LogFormat, TracingLog, init_logging};
pub use record::{Action, EventRecord};
pub use reporter::{Reporter, StatsSink};
pub use sampler::{MemorySampler, ProcStatusSampler, RSS_UNAVAILABLE};
pub use statsd::{StatsdSink, init_metrics};
pub use tracker::Tracker;
