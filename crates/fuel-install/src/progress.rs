//! Download progress shared between workers and the coordinator

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters updated by workers while a pass runs
#[derive(Debug)]
pub struct ProgressState {
    total_size: AtomicU64,
    downloaded_size: AtomicU64,
    completed_files: AtomicU64,
    skipped_files: AtomicU64,
    failed_files: AtomicU64,
    started: Instant,
}

impl ProgressState {
    /// Start tracking a pass that downloads `total_size` bytes
    pub fn new(total_size: u64) -> Self {
        Self {
            total_size: AtomicU64::new(total_size),
            downloaded_size: AtomicU64::new(0),
            completed_files: AtomicU64::new(0),
            skipped_files: AtomicU64::new(0),
            failed_files: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record received body bytes
    pub fn add_downloaded(&self, bytes: u64) {
        self.downloaded_size.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a file that was downloaded and verified
    pub fn file_completed(&self) {
        self.completed_files.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a file that already matched its target hash
    ///
    /// Its planned bytes count as downloaded so the percentage still
    /// reaches 100.
    pub fn file_skipped(&self, planned_size: u64) {
        self.skipped_files.fetch_add(1, Ordering::Relaxed);
        self.downloaded_size.fetch_add(planned_size, Ordering::Relaxed);
    }

    /// Record a failed file
    pub fn file_failed(&self) {
        self.failed_files.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough view for reporting
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_size: self.total_size.load(Ordering::Relaxed),
            downloaded_size: self.downloaded_size.load(Ordering::Relaxed),
            completed_files: self.completed_files.load(Ordering::Relaxed),
            skipped_files: self.skipped_files.load(Ordering::Relaxed),
            failed_files: self.failed_files.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }
}

/// Point-in-time copy of [`ProgressState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Planned transfer size
    pub total_size: u64,
    /// Bytes received so far (retries count again)
    pub downloaded_size: u64,
    /// Files downloaded and verified
    pub completed_files: u64,
    /// Files already up to date
    pub skipped_files: u64,
    /// Files that failed
    pub failed_files: u64,
    /// Time since the pass started
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Completion percentage, capped at 100
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total_size == 0 {
            return 100.0;
        }
        (self.downloaded_size as f64 / self.total_size as f64 * 100.0).min(100.0)
    }

    /// Average transfer rate in bytes per second
    #[allow(clippy::cast_precision_loss)]
    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.downloaded_size as f64 / secs
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}% {}/{} ({}/s)",
            self.percentage(),
            readable_size(self.downloaded_size),
            readable_size(self.total_size),
            readable_size(self.bytes_per_second() as u64)
        )
    }
}

/// Render a byte count with a binary unit, e.g. `1.50 MiB`
#[allow(clippy::cast_precision_loss)]
pub fn readable_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_readable_size() {
        assert_eq!(readable_size(0), "0 B");
        assert_eq!(readable_size(1023), "1023 B");
        assert_eq!(readable_size(1024), "1.00 KiB");
        assert_eq!(readable_size(1536 * 1024), "1.50 MiB");
        assert_eq!(readable_size(5 * 1024 * 1024 * 1024), "5.00 GiB");
    }

    #[test]
    fn test_counters() {
        let progress = ProgressState::new(200);
        progress.add_downloaded(50);
        progress.file_skipped(50);
        progress.file_completed();
        progress.file_failed();

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.downloaded_size, 100);
        assert_eq!(snapshot.completed_files, 1);
        assert_eq!(snapshot.skipped_files, 1);
        assert_eq!(snapshot.failed_files, 1);
        assert!((snapshot.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentage_edges() {
        assert!((ProgressState::new(0).snapshot().percentage() - 100.0).abs() < f64::EPSILON);

        let progress = ProgressState::new(10);
        progress.add_downloaded(25);
        assert!((progress.snapshot().percentage() - 100.0).abs() < f64::EPSILON);
    }
}
