use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::errors::{ClipError, ClipResult};
use crate::metrics::ScanMetrics;
use crate::parser::parse_line;
use crate::region::Region;
use crate::results::FileResult;

// Point files are usually tens to hundreds of MB
const BUFFER_CAPACITY: usize = 256 * 1024;
const LINE_CAPACITY: usize = 128;

/// One unit of work: a point file to scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub path: PathBuf,
}

impl Job {
    pub fn new(id: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}

/// Keeps one out of every `stride` consecutive matches.
///
/// The counter only moves on matches: a match is kept when the counter is 0,
/// the counter then advances and wraps back to 0 when it reaches `stride`.
/// Kept positions in the match sequence are 0, stride, 2 * stride, ...
#[derive(Debug, Clone)]
pub struct Decimator {
    stride: usize,
    counter: usize,
}

impl Decimator {
    pub fn new(stride: NonZeroUsize) -> Self {
        Self {
            stride: stride.get(),
            counter: 0,
        }
    }

    /// Registers one match and returns whether it is kept.
    #[inline]
    pub fn keep(&mut self) -> bool {
        let keep = self.counter == 0;
        self.counter += 1;
        if self.counter == self.stride {
            self.counter = 0;
        }
        keep
    }
}

/// Streams point files and collects the lines that fall inside a region
#[derive(Debug, Clone)]
pub struct FileScanner {
    region: Region,
    stride: NonZeroUsize,
    metrics: ScanMetrics,
}

impl FileScanner {
    /// Creates a scanner for the given region and decimation stride
    pub fn new(region: Region, stride: NonZeroUsize) -> Self {
        Self {
            region,
            stride,
            metrics: ScanMetrics::new(),
        }
    }

    /// Uses an existing metrics handle instead of a fresh one
    pub fn with_metrics(mut self, metrics: ScanMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Gets the metrics handle shared by clones of this scanner
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Scans one job's file
    pub fn scan(&self, job: &Job) -> ClipResult<FileResult> {
        trace!("Scanning file: {}", job.path.display());

        let file = File::open(&job.path).map_err(|e| ClipError::from_io(&job.path, e))?;
        let reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let result = self.scan_reader(job.id, &job.path, reader)?;

        debug!(
            "{}: {} rows, {} kept, {} malformed",
            job.path.display(),
            result.rows_seen,
            result.matched_lines.len(),
            result.rows_malformed
        );
        Ok(result)
    }

    /// Scans any buffered reader line by line without loading it whole
    pub fn scan_reader<R: BufRead>(
        &self,
        job_id: usize,
        path: &Path,
        mut reader: R,
    ) -> ClipResult<FileResult> {
        let mut result = FileResult::new(job_id, path);
        let mut decimator = Decimator::new(self.stride);
        let mut buf = Vec::with_capacity(LINE_CAPACITY);
        let mut bytes_read = 0u64;

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| ClipError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            bytes_read += n as u64;
            result.rows_seen += 1;

            let Ok(line) = std::str::from_utf8(&buf) else {
                result.rows_malformed += 1;
                continue;
            };

            match parse_line(line) {
                Some(point) => {
                    if self.region.contains(point.x, point.y) && decimator.keep() {
                        result.matched_lines.push(point.raw.to_owned());
                    }
                }
                None => result.rows_malformed += 1,
            }
        }

        self.metrics.record_file_scanned(bytes_read);
        Ok(result)
    }
}
