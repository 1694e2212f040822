//! Structured record logging.
//!
//! Each execution phase writes its full record to an [`EventLog`]. The
//! default implementation forwards to `tracing` at `info`; a buffered
//! JSONL writer is available for frameworks that collect worker records
//! into files. Both are best-effort: a log failure never reaches the job.

use std::io::{BufWriter, IsTerminal, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::record::EventRecord;

/// Destination for per-phase worker records.
///
/// Implementations are shared across concurrently tracked jobs and must
/// be safe for simultaneous use; writes are infallible from the tracker's
/// point of view.
pub trait EventLog: Send + Sync {
    /// Writes one record.
    fn write(&self, record: &EventRecord);
}

/// Log that emits records through the global `tracing` subscriber.
///
/// The record is serialized to a single JSON object and attached to an
/// `info` event under the `record` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl TracingLog {
    /// Creates the log.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventLog for TracingLog {
    fn write(&self, record: &EventRecord) {
        if let Ok(json) = serde_json::to_string(record) {
            info!(target: "sidekiq_telemetry", record = %json, "worker event");
        }
    }
}

/// Thread-safe, buffered JSONL record writer.
///
/// Each record becomes a single JSON line, flushed immediately.
/// Serialization or I/O failures are silently dropped because telemetry
/// must never crash a worker.
pub struct JsonLinesLog {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
}

// Box<dyn Write> is not Debug — provide a manual impl.
impl std::fmt::Debug for JsonLinesLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesLog").finish_non_exhaustive()
    }
}

impl JsonLinesLog {
    /// Creates a log that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }

    /// Creates a log that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates a log that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a log that silently discards all records.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates a log that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }
}

impl EventLog for JsonLinesLog {
    fn write(&self, record: &EventRecord) {
        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(record) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }
}

/// Log output format for [`init_logging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Maps a verbosity level to a tracing directive string.
///
/// - 0 → `"warn"`
/// - 1 → `"info"`
/// - 2 → `"debug"`
/// - 3+ → `"trace"` (saturates)
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initializes the global tracing subscriber.
///
/// If `SIDEKIQ_TELEMETRY_LOG` is set it takes precedence over `verbosity`.
/// Output goes to stderr. Uses `try_init()` so calling this more than once
/// (e.g. in tests) is safe.
pub fn init_logging(format: LogFormat, verbosity: u8) {
    let filter = EnvFilter::try_from_env("SIDEKIQ_TELEMETRY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let show_target = verbosity >= 2;
    let use_ansi = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();

    match format {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_ansi)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
