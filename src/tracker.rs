//! Job execution tracking.
//!
//! [`Tracker::track`] wraps a single job body, emitting a start record
//! before the body runs and exactly one finish/failed record afterwards —
//! whether the body returns, errors, or unwinds. The job's own outcome is
//! the only thing a caller ever observes; telemetry is a pure side effect.

use std::sync::Arc;
use std::time::Instant;

use crate::job::{ArgsDescriber, JobDescriptor};
use crate::log::EventLog;
use crate::record::{Action, EventRecord, base_record, keys};
use crate::reporter::Reporter;
use crate::sampler::MemorySampler;

/// Wraps job executions to capture lifecycle telemetry.
///
/// Holds no per-job state: everything a tracked call needs lives on that
/// call's stack, so one tracker is safely shared across worker threads.
#[derive(Clone)]
pub struct Tracker {
    log: Arc<dyn EventLog>,
    reporter: Reporter,
    sampler: Arc<dyn MemorySampler>,
    describer: Option<Arc<dyn ArgsDescriber>>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker").finish_non_exhaustive()
    }
}

impl Tracker {
    /// Creates a tracker over the given collaborators.
    #[must_use]
    pub fn new(log: Arc<dyn EventLog>, reporter: Reporter, sampler: Arc<dyn MemorySampler>) -> Self {
        Self {
            log,
            reporter,
            sampler,
            describer: None,
        }
    }

    /// Adds a worker-specific argument describer whose fields are merged
    /// into the base record without overwriting core fields.
    #[must_use]
    pub fn with_args_describer(mut self, describer: Arc<dyn ArgsDescriber>) -> Self {
        self.describer = Some(describer);
        self
    }

    /// Tracks one job execution.
    ///
    /// Emits the start record, runs `body`, then emits a finish record on
    /// `Ok` or a failed record on `Err` — the body's result is returned
    /// unchanged either way. A panicking body still gets its failed record
    /// before the unwind continues.
    ///
    /// # Errors
    ///
    /// Returns exactly the error the body returned; tracking itself never
    /// fails.
    pub fn track<T, E, F>(&self, descriptor: &JobDescriptor, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let started = Instant::now();
        let start_rss = self.sampler.rss_bytes();

        let mut base = base_record(descriptor);
        if let Some(describer) = &self.describer {
            if let Some(extra) = describer.describe(descriptor) {
                base.merge_missing(&extra);
            }
        }

        self.track_start(&base, start_rss);

        let guard = FinishGuard {
            tracker: self,
            base: &base,
            started,
            start_rss,
            completed: false,
        };
        let outcome = body();
        let action = if outcome.is_ok() {
            Action::Finish
        } else {
            Action::Failed
        };
        guard.complete(action);
        outcome
    }

    fn track_start(&self, base: &EventRecord, start_rss: f64) {
        let mut record = base.clone();
        record.fill_missing(keys::ACTION, Action::Start.as_str());
        record.fill_missing(keys::MEMORY_RSS, start_rss);
        self.emit(&record);
    }

    fn track_finish(&self, base: &EventRecord, action: Action, started: Instant, start_rss: f64) {
        let duration = started.elapsed().as_secs_f64();
        let end_rss = self.sampler.rss_bytes();
        let mut record = base.clone();
        record.fill_missing(keys::ACTION, action.as_str());
        record.fill_missing(keys::DURATION, duration);
        record.fill_missing(keys::MEMORY_RSS_DIFF, end_rss - start_rss);
        record.fill_missing(keys::MEMORY_RSS, end_rss);
        self.emit(&record);
    }

    fn emit(&self, record: &EventRecord) {
        self.log.write(record);
        self.reporter.report(record);
    }
}

/// Deferred finalization for one tracked call.
///
/// [`complete`](Self::complete) emits the finish/failed record on the
/// normal paths; the `Drop` impl covers an unwinding body so the record
/// is emitted exactly once on every exit path.
struct FinishGuard<'a> {
    tracker: &'a Tracker,
    base: &'a EventRecord,
    started: Instant,
    start_rss: f64,
    completed: bool,
}

impl FinishGuard<'_> {
    fn complete(mut self, action: Action) {
        self.completed = true;
        self.tracker
            .track_finish(self.base, action, self.started, self.start_rss);
    }
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.tracker
                .track_finish(self.base, Action::Failed, self.started, self.start_rss);
        }
    }
}
