//! Process memory sampling.
//!
//! Reads the current process's resident set size from the kernel's
//! per-process status interface. Sampling is strictly best-effort: any
//! failure yields [`RSS_UNAVAILABLE`] so a broken `/proc` can never break
//! job tracking, while still being visible on dashboards as a negative
//! memory reading.

use std::fs::File;
use std::io::Read;
use std::sync::LazyLock;

use regex::Regex;

/// Sentinel for "measurement unavailable", distinct from a true zero.
pub const RSS_UNAVAILABLE: f64 = -1.0;

/// Upper bound on how much of the status file is read.
///
/// `VmRSS` appears well within the first 4 KiB; a short read is fine as
/// long as the field is inside it.
const STATUS_READ_LIMIT: usize = 4096;

static VM_RSS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"VmRSS:\s*(\d+) kB").expect("valid regex"));

/// Source of the current process's resident memory size.
pub trait MemorySampler: Send + Sync {
    /// Current RSS in bytes, or [`RSS_UNAVAILABLE`] when it cannot be read.
    fn rss_bytes(&self) -> f64;
}

/// Sampler backed by `/proc/<pid>/status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStatusSampler;

impl ProcStatusSampler {
    /// Creates the sampler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MemorySampler for ProcStatusSampler {
    fn rss_bytes(&self) -> f64 {
        read_status()
            .as_deref()
            .and_then(parse_rss_bytes)
            .unwrap_or(RSS_UNAVAILABLE)
    }
}

/// One bounded read of the status pseudo-file. A partial read is
/// acceptable; pseudo-files report no meaningful length up front.
fn read_status() -> Option<String> {
    let path = format!("/proc/{}/status", std::process::id());
    let mut file = File::open(path).ok()?;
    let mut buf = [0u8; STATUS_READ_LIMIT];
    let n = file.read(&mut buf).ok()?;
    Some(String::from_utf8_lossy(&buf[..n]).into_owned())
}

/// Extracts the `VmRSS` kilobyte value and converts it to bytes.
fn parse_rss_bytes(status: &str) -> Option<f64> {
    let captures = VM_RSS.captures(status)?;
    captures[1].parse::<f64>().ok().map(|kb| kb * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vmrss_line() {
        let status = "Name:\tworker\nVmPeak:\t  5000 kB\nVmRSS:\t  1234 kB\nThreads:\t8\n";
        assert_eq!(parse_rss_bytes(status), Some(1234.0 * 1024.0));
    }

    #[test]
    fn missing_field_yields_none() {
        assert_eq!(parse_rss_bytes("Name:\tworker\nThreads:\t8\n"), None);
        assert_eq!(parse_rss_bytes(""), None);
    }

    #[test]
    fn truncated_line_yields_none() {
        // A short read can cut the file before (or inside) the VmRSS line.
        assert_eq!(parse_rss_bytes("Name:\tworker\nVmRSS:\t  12"), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_sample_is_positive() {
        let rss = ProcStatusSampler::new().rss_bytes();
        assert!(rss > 0.0, "expected a live RSS reading, got {rss}");
        // kB granularity from the kernel
        assert_eq!(rss % 1024.0, 0.0);
    }
}
