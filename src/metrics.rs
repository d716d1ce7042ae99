// Scan metrics
//
// Lightweight counters for one scan run, fed from the scan event stream

use crate::state::ScanEvent;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Per-scan counters
///
/// Uses atomic operations so worker threads can record without locks. A
/// [`ScanContext`](crate::state::ScanContext) feeds every event through
/// [`record_event`](Self::record_event); the totals are logged once the scan ends.
#[derive(Debug)]
pub struct ScanMetrics {
    /// Mod directories resolved for scanning
    pub mods_resolved: AtomicUsize,

    /// Files read and matched against the patterns
    pub files_scanned: AtomicUsize,

    /// Files passed over by the size or text gate
    pub files_skipped: AtomicUsize,

    /// Files that could not be read or decoded
    pub files_failed: AtomicUsize,

    /// Raw matches produced
    pub matches_found: AtomicUsize,

    /// Roots skipped by the mod resolver
    pub directories_skipped: AtomicUsize,

    /// Time spent in file extraction, in milliseconds
    pub extraction_time_ms: AtomicU64,

    start_time: Instant,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            mods_resolved: AtomicUsize::new(0),
            files_scanned: AtomicUsize::new(0),
            files_skipped: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            matches_found: AtomicUsize::new(0),
            directories_skipped: AtomicUsize::new(0),
            extraction_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Update the counters for one scan event.
    pub fn record_event(&self, event: &ScanEvent) {
        match event {
            ScanEvent::ModResolved { .. } => {
                self.mods_resolved.fetch_add(1, Ordering::Relaxed);
            }
            ScanEvent::DirectorySkipped { .. } => {
                self.directories_skipped.fetch_add(1, Ordering::Relaxed);
            }
            ScanEvent::FileScanned { matches, .. } => {
                self.files_scanned.fetch_add(1, Ordering::Relaxed);
                self.matches_found.fetch_add(*matches, Ordering::Relaxed);
            }
            ScanEvent::FileSkipped { .. } => {
                self.files_skipped.fetch_add(1, Ordering::Relaxed);
            }
            ScanEvent::FileFailed { .. } => {
                self.files_failed.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    /// Add time spent extracting one mod
    pub fn record_extraction_time(&self, duration: Duration) {
        self.extraction_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn files_scanned(&self) -> usize {
        self.files_scanned.load(Ordering::Relaxed)
    }

    pub fn matches_found(&self) -> usize {
        self.matches_found.load(Ordering::Relaxed)
    }

    /// Time since the metrics were created
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average extraction time per scanned file in milliseconds
    pub fn avg_file_time_ms(&self) -> f64 {
        let total = self.extraction_time_ms.load(Ordering::Relaxed);
        let count = self.files_scanned();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Scan Metrics Summary ===");
        tracing::info!("Elapsed: {:.2}s", self.elapsed().as_secs_f64());
        tracing::info!(
            "Mods: {} resolved, {} directories skipped",
            self.mods_resolved.load(Ordering::Relaxed),
            self.directories_skipped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Files: {} scanned, {} skipped, {} failed",
            self.files_scanned(),
            self.files_skipped.load(Ordering::Relaxed),
            self.files_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Matches: {} (extraction {:.2}s, avg {:.2}ms per file)",
            self.matches_found(),
            self.extraction_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_file_time_ms()
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}
