use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info, warn};

use crate::config::ClipConfig;
use crate::errors::{ClipError, ClipResult};
use crate::filters::list_point_files;
use crate::metrics::ScanMetrics;
use crate::pool::{CancelFlag, WorkerPool};
use crate::region::Region;
use crate::results::{AggregateTotals, Aggregator, RunSummary};
use crate::scanner::{FileScanner, Job};

const OUTPUT_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Runs a complete clipping pass as described by `config`
pub fn run(config: &ClipConfig) -> ClipResult<RunSummary> {
    run_with_cancel(config, &CancelFlag::new())
}

/// Like [`run`], but stops picking up new files once `cancel` is set.
///
/// A cancelled run returns [`ClipError::Cancelled`] and leaves any existing
/// output file untouched.
pub fn run_with_cancel(config: &ClipConfig, cancel: &CancelFlag) -> ClipResult<RunSummary> {
    let started = Instant::now();

    // Startup checks; nothing is written before these pass
    let region = config
        .region
        .ok_or(ClipError::MissingRegion)?
        .into_region()?;
    let files = list_point_files(&config.input_dir, &config.extension)?;
    let sink = create_output(&config.output)?;

    info!(
        "Clipping {} files in {} to {} (stride {})",
        files.len(),
        config.input_dir.display(),
        region,
        config.stride
    );
    if files.is_empty() {
        warn!(
            "No .{} files found in {}",
            config.extension,
            config.input_dir.display()
        );
    }

    let jobs: Vec<Job> = files
        .into_iter()
        .enumerate()
        .map(|(id, path)| Job::new(id, path))
        .collect();
    let files_found = jobs.len();
    let pool = WorkerPool::new(config.max_workers());
    let workers = pool.size_for(files_found);

    let progress = if config.show_progress {
        let bar = ProgressBar::new(files_found as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} files")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let metrics = ScanMetrics::new();
    let (totals, sink) = clip_files(
        jobs,
        region,
        config.stride,
        pool,
        cancel,
        &metrics,
        BufWriter::with_capacity(OUTPUT_BUFFER_CAPACITY, sink),
        |_| progress.inc(1),
    )?;
    progress.finish_and_clear();

    if cancel.is_cancelled() {
        info!("Run cancelled; discarding partial output");
        return Err(ClipError::Cancelled);
    }

    let temp = sink.into_inner().map_err(|e| e.into_error())?;
    temp.persist(&config.output)
        .map_err(|e| ClipError::output_unwritable(&config.output, e.error))?;

    metrics.log_stats();
    let elapsed = started.elapsed();
    info!(
        "Processed {} rows, kept {} in {}",
        totals.total_rows_seen,
        totals.rows_written,
        humantime::format_duration(round_to_millis(elapsed))
    );

    Ok(RunSummary {
        files_found,
        workers,
        stride: config.stride.get(),
        totals,
        bytes_read: metrics.get_stats().bytes_read,
        elapsed_ms: elapsed.as_millis() as u64,
        output: config.output.clone(),
    })
}

/// Scans `jobs` with a bounded pool and writes kept lines into `sink`.
///
/// This is the core of a run without any file-system setup, so it can be
/// driven with an in-memory sink. `on_report` is called once per absorbed
/// report, after its lines were written.
#[allow(clippy::too_many_arguments)]
pub fn clip_files<W, F>(
    jobs: Vec<Job>,
    region: Region,
    stride: NonZeroUsize,
    pool: WorkerPool,
    cancel: &CancelFlag,
    metrics: &ScanMetrics,
    sink: W,
    mut on_report: F,
) -> ClipResult<(AggregateTotals, W)>
where
    W: Write,
    F: FnMut(&AggregateTotals),
{
    let scanner = FileScanner::new(region, stride).with_metrics(metrics.clone());
    let mut aggregator = Aggregator::new(sink);

    let received = pool.run(jobs, &scanner, cancel, |report| {
        aggregator.absorb(report)?;
        on_report(aggregator.totals());
        Ok(())
    })?;

    debug!("Aggregated {} reports", received);
    aggregator.finish()
}

/// Checks the output target and creates the temporary output next to it, so
/// that persisting is a same-filesystem rename.
///
/// The target must not be a directory, its parent must exist and an existing
/// target must be writable. A replaced file keeps its mode; a new one gets the
/// mode of any freshly created file.
fn create_output(output: &Path) -> ClipResult<NamedTempFile> {
    if output.is_dir() {
        return Err(ClipError::output_unwritable(output, "is a directory"));
    }
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.is_dir() {
        return Err(ClipError::output_unwritable(
            output,
            format!("directory {} does not exist", parent.display()),
        ));
    }

    let existing = match fs::metadata(output) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(ClipError::output_unwritable(output, e)),
    };
    if existing.as_ref().is_some_and(|perms| perms.readonly()) {
        return Err(ClipError::output_unwritable(output, "file is read-only"));
    }

    let mut builder = Builder::new();
    builder.prefix(".pointclip-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Masked by the umask like any new file
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let temp = builder
        .tempfile_in(&parent)
        .map_err(|e| ClipError::output_unwritable(output, e))?;

    if let Some(perms) = existing {
        temp.as_file()
            .set_permissions(perms)
            .map_err(|e| ClipError::output_unwritable(output, e))?;
    }
    Ok(temp)
}

fn round_to_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}
