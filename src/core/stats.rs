//! Output statistics
//!
//! Lines and bytes written per originating severity, plus lines lost to
//! sink failures. Cascaded copies are not counted again.

use super::severity::{Severity, NUM_SEVERITY};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one severity
///
/// # Example
///
/// ```
/// use rust_leveled_logger::core::OutputStats;
///
/// let stats = OutputStats::new();
/// stats.record(42);
/// assert_eq!(stats.lines(), 1);
/// assert_eq!(stats.bytes(), 42);
/// ```
#[derive(Debug)]
pub struct OutputStats {
    lines: AtomicU64,
    bytes: AtomicU64,
}

impl OutputStats {
    pub const fn new() -> Self {
        Self {
            lines: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn lines(&self) -> u64 {
        self.lines.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record(&self, bytes: usize) {
        self.lines.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }
}

impl Default for OutputStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct LogStats {
    per_severity: [OutputStats; NUM_SEVERITY],
    dropped: AtomicU64,
}

impl LogStats {
    pub const fn new() -> Self {
        Self {
            per_severity: [
                OutputStats::new(),
                OutputStats::new(),
                OutputStats::new(),
                OutputStats::new(),
            ],
            dropped: AtomicU64::new(0),
        }
    }

    pub fn severity(&self, severity: Severity) -> &OutputStats {
        &self.per_severity[severity.index()]
    }

    /// Record a line that could not be written anywhere; returns the
    /// previous count.
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn total_lines(&self) -> u64 {
        self.per_severity.iter().map(OutputStats::lines).sum()
    }
}
