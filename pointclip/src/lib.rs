pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod pool;
pub mod region;
pub mod results;
pub mod scanner;

pub use config::{ClipConfig, ClipOverrides};
pub use errors::{ClipError, ClipResult};
pub use pipeline::{clip_files, run, run_with_cancel};
pub use pool::{CancelFlag, JobReport, WorkerPool};
pub use region::{Region, RegionSpec};
pub use results::{AggregateTotals, Aggregator, FileResult, RunSummary};
pub use scanner::{Decimator, FileScanner, Job};
