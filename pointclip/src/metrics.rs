use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Tracks I/O and file outcome counters across workers
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // I/O
    bytes_read: Arc<AtomicU64>,
    largest_file: Arc<AtomicU64>,

    // File outcomes
    files_scanned: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
    files_cancelled: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            bytes_read: Arc::new(AtomicU64::new(0)),
            largest_file: Arc::new(AtomicU64::new(0)),
            files_scanned: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
            files_cancelled: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a fully scanned file and the number of bytes read from it
    pub fn record_file_scanned(&self, bytes: u64) {
        let total = self.bytes_read.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.files_scanned.fetch_add(1, Ordering::Relaxed);

        let mut largest = self.largest_file.load(Ordering::Relaxed);
        while bytes > largest {
            match self.largest_file.compare_exchange_weak(
                largest,
                bytes,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => largest = current,
            }
        }
        debug!("Scanned {} bytes, total read: {} bytes", bytes, total);
    }

    /// Records a file that could not be scanned
    pub fn record_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file skipped because the run was cancelled
    pub fn record_file_cancelled(&self) {
        self.files_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets a snapshot of the counters
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            largest_file: self.largest_file.load(Ordering::Relaxed),
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            files_cancelled: self.files_cancelled.load(Ordering::Relaxed),
        }
    }

    /// Logs the current counters
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Bytes read: {} bytes\n\
             Largest file: {} bytes\n\
             Files (scanned/failed/cancelled): {}/{}/{}",
            stats.bytes_read,
            stats.largest_file,
            stats.files_scanned,
            stats.files_failed,
            stats.files_cancelled
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub bytes_read: u64,
    pub largest_file: u64,
    pub files_scanned: u64,
    pub files_failed: u64,
    pub files_cancelled: u64,
}
