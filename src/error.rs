//! Error types for `sidekiq-telemetry`.
//!
//! Only setup paths are fallible (opening a file-backed record log,
//! installing the metrics recorder). The tracking hot path never returns
//! an error of its own: the wrapped job's outcome is the only result a
//! caller can observe.

use thiserror::Error;

/// Top-level error type for telemetry setup operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Metrics recorder could not be installed (e.g. port already in use)
    #[error("metrics recorder installation failed: {0}")]
    MetricsInit(String),
}

/// Result type alias for telemetry setup operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;
