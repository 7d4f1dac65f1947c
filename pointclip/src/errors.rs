/// Error types for clipping runs.
///
/// Errors fall into three groups:
///
/// 1. **Startup errors** (`MissingRegion`, `InvalidRegion`,
///    `InputDirNotFound`, `OutputUnwritable`, `Config`, `ConfigError`) abort a
///    run before any worker starts.
/// 2. **Per-file errors** (`FileNotFound`, `PermissionDenied`, `FileIo`,
///    `Cancelled`) are carried inside a `JobReport`; the aggregator logs and
///    counts them and the run continues.
/// 3. **Pool errors** (`PoolDisconnected`, `ThreadPool`) mean the worker pool
///    itself broke down and the run cannot produce a trustworthy output.
///
/// ```rust,ignore
/// match pointclip::run(&config) {
///     Ok(summary) => println!("Processed rows: {}", summary.totals.total_rows_seen),
///     Err(ClipError::MissingRegion) => eprintln!("a region is required"),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for clipping operations
pub type ClipResult<T> = Result<T, ClipError>;

/// Errors that can occur while clipping point files
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("IO error in {path}: {source}")]
    FileIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Input directory not found: {0}")]
    InputDirNotFound(PathBuf),
    #[error("No region given")]
    MissingRegion,
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
    #[error("Cannot write output {path}: {reason}")]
    OutputUnwritable { path: PathBuf, reason: String },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Worker pool disconnected after {received} of {expected} results")]
    PoolDisconnected { expected: usize, received: usize },
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
    #[error("Run cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ClipError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_region(msg: impl Into<String>) -> Self {
        Self::InvalidRegion(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn output_unwritable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::OutputUnwritable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Maps an I/O error raised while opening or reading `path` onto the
    /// matching per-file variant.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::FileIo {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// True for errors that only affect a single input file.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::PermissionDenied(_) | Self::FileIo { .. }
        )
    }
}
