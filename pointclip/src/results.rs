/// Result types and the aggregator that merges per-file results into the
/// output sink.
///
/// Ownership follows the data flow: a worker builds a [`FileResult`] and moves
/// it into a [`JobReport`](crate::pool::JobReport); the report is moved over
/// the channel to the [`Aggregator`], which consumes it. No result is ever
/// shared between a worker and the aggregator.
///
/// Across files, lines are written in arrival order, which depends on
/// scheduling and is not stable between runs. Within a file, lines keep their
/// scan order.
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{ClipError, ClipResult};
use crate::pool::JobReport;

/// Outcome of scanning a single point file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileResult {
    /// The job this result belongs to
    pub job_id: usize,
    /// The scanned file
    pub path: PathBuf,
    /// Every line read, matched or not
    pub rows_seen: u64,
    /// Lines that could not be parsed as a point
    pub rows_malformed: u64,
    /// Kept lines, verbatim and in file order
    pub matched_lines: Vec<String>,
}

impl FileResult {
    pub fn new(job_id: usize, path: &Path) -> Self {
        Self {
            job_id,
            path: path.to_path_buf(),
            ..Default::default()
        }
    }
}

/// Totals accumulated by the aggregator over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateTotals {
    /// Rows read across all successfully scanned files
    pub total_rows_seen: u64,
    /// Rows that could not be parsed
    pub rows_malformed: u64,
    /// Lines written to the output
    pub rows_written: u64,
    pub files_scanned: usize,
    pub files_failed: usize,
    pub files_cancelled: usize,
}

impl AggregateTotals {
    /// Number of reports absorbed so far
    pub fn reports(&self) -> usize {
        self.files_scanned + self.files_failed + self.files_cancelled
    }
}

/// Drains job reports into a sink and keeps the running totals.
///
/// The aggregator is the only writer of the sink.
#[derive(Debug)]
pub struct Aggregator<W: Write> {
    sink: W,
    totals: AggregateTotals,
}

impl<W: Write> Aggregator<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            totals: AggregateTotals::default(),
        }
    }

    pub fn totals(&self) -> &AggregateTotals {
        &self.totals
    }

    /// Consumes one report. Failed and cancelled jobs are counted and
    /// otherwise ignored; sink write errors and errors that are not scoped to
    /// a single file are returned.
    pub fn absorb(&mut self, report: JobReport) -> ClipResult<()> {
        match report.outcome {
            Ok(result) => self.write_result(result),
            Err(ClipError::Cancelled) => {
                debug!("Skipped {} (cancelled)", report.job.path.display());
                self.totals.files_cancelled += 1;
                Ok(())
            }
            Err(e) if e.is_per_file() => {
                warn!("Skipping {}: {}", report.job.path.display(), e);
                self.totals.files_failed += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn write_result(&mut self, result: FileResult) -> ClipResult<()> {
        for line in &result.matched_lines {
            self.sink.write_all(line.as_bytes())?;
            self.sink.write_all(b"\n")?;
        }

        self.totals.total_rows_seen += result.rows_seen;
        self.totals.rows_malformed += result.rows_malformed;
        self.totals.rows_written += result.matched_lines.len() as u64;
        self.totals.files_scanned += 1;
        Ok(())
    }

    /// Flushes the sink and hands back the totals and the sink
    pub fn finish(mut self) -> ClipResult<(AggregateTotals, W)> {
        self.sink.flush()?;
        Ok((self.totals, self.sink))
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Input files found in the data directory
    pub files_found: usize,
    /// Workers actually started
    pub workers: usize,
    pub stride: usize,
    #[serde(flatten)]
    pub totals: AggregateTotals,
    pub bytes_read: u64,
    pub elapsed_ms: u64,
    pub output: PathBuf,
}
