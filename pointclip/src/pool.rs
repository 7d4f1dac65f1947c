/// Bounded worker pool for scanning point files.
///
/// Jobs go into a pre-filled, closed `crossbeam_channel`; each worker pulls
/// the next job until the channel is drained, so every job is received by
/// exactly one worker. Workers run on a dedicated rayon pool and push one
/// [`JobReport`] per job into a bounded report channel. The caller's
/// `on_report` callback runs on the calling thread while the workers are
/// still busy, which keeps the number of undrained results bounded.
///
/// ```rust,ignore
/// let pool = WorkerPool::new(NonZeroUsize::new(8).unwrap());
/// let received = pool.run(jobs, &scanner, &cancel, |report| aggregator.absorb(report))?;
/// ```
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::errors::{ClipError, ClipResult};
use crate::results::FileResult;
use crate::scanner::{FileScanner, Job};

/// A job together with its scan outcome
#[derive(Debug)]
pub struct JobReport {
    pub job: Job,
    pub outcome: ClipResult<FileResult>,
}

/// Shared flag that asks workers to stop picking up new files
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The underlying flag, for signal handlers that set it directly
    pub fn as_arc(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// A fixed-size pool of scanning workers
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_workers: NonZeroUsize,
}

impl WorkerPool {
    pub fn new(max_workers: NonZeroUsize) -> Self {
        Self { max_workers }
    }

    /// Number of workers that will be started for `job_count` jobs
    pub fn size_for(&self, job_count: usize) -> usize {
        self.max_workers.get().min(job_count)
    }

    /// Scans every job and feeds the reports to `on_report`.
    ///
    /// Returns the number of reports delivered, which equals `jobs.len()`
    /// unless the pool broke down. An error from `on_report` stops the run:
    /// pending jobs are cancelled and the error is returned once workers exit.
    pub fn run<F>(
        &self,
        jobs: Vec<Job>,
        scanner: &FileScanner,
        cancel: &CancelFlag,
        mut on_report: F,
    ) -> ClipResult<usize>
    where
        F: FnMut(JobReport) -> ClipResult<()>,
    {
        let expected = jobs.len();
        if expected == 0 {
            return Ok(0);
        }

        let workers = self.size_for(expected);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("pointclip-worker-{}", i))
            .build()
            .map_err(|e| ClipError::ThreadPool(e.to_string()))?;

        let (job_tx, job_rx) = unbounded::<Job>();
        for job in jobs {
            // The receiver is alive, so this cannot fail
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let (report_tx, report_rx) = bounded::<JobReport>(workers * 2);

        debug!("Starting {} workers for {} files", workers, expected);

        pool.in_place_scope(|scope| {
            for worker_id in 0..workers {
                let job_rx = job_rx.clone();
                let report_tx = report_tx.clone();
                let scanner = scanner.clone();
                let cancel = cancel.clone();
                scope.spawn(move |_| worker_loop(worker_id, job_rx, report_tx, &scanner, &cancel));
            }
            // Only workers hold senders now; the channel closes when they exit
            drop(report_tx);

            collect_reports(&report_rx, expected, cancel, &mut on_report)
        })
    }
}

/// Pulls jobs until the queue is empty and reports each one exactly once
fn worker_loop(
    worker_id: usize,
    jobs: Receiver<Job>,
    reports: Sender<JobReport>,
    scanner: &FileScanner,
    cancel: &CancelFlag,
) {
    let metrics = scanner.metrics();
    while let Ok(job) = jobs.recv() {
        let outcome = if cancel.is_cancelled() {
            metrics.record_file_cancelled();
            Err(ClipError::Cancelled)
        } else {
            trace!("Worker {} picked job {}", worker_id, job.id);
            let outcome = scanner.scan(&job);
            if outcome.is_err() {
                metrics.record_file_failed();
            }
            outcome
        };

        if reports.send(JobReport { job, outcome }).is_err() {
            // Collector is gone; nothing left to report to
            break;
        }
    }
    trace!("Worker {} finished", worker_id);
}

/// Blocks until `expected` reports arrived or every worker exited
fn collect_reports<F>(
    reports: &Receiver<JobReport>,
    expected: usize,
    cancel: &CancelFlag,
    on_report: &mut F,
) -> ClipResult<usize>
where
    F: FnMut(JobReport) -> ClipResult<()>,
{
    let mut received = 0;
    let mut failure = None;

    while received < expected {
        let Ok(report) = reports.recv() else {
            break;
        };
        received += 1;
        if failure.is_none() {
            if let Err(e) = on_report(report) {
                // Let workers drain the queue quickly, then surface the error
                cancel.cancel();
                failure = Some(e);
            }
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }
    if received < expected {
        return Err(ClipError::PoolDisconnected { expected, received });
    }
    Ok(received)
}
