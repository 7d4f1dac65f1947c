use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{ClipError, ClipResult};
use crate::region::RegionSpec;

/// Configuration for a clipping run.
///
/// # Configuration Locations
///
/// Values are layered from these files, later ones winning:
/// 1. Global `$CONFIG_DIR/pointclip/config.yaml`
/// 2. Local `.pointclip.yaml` in the current directory
/// 3. A file given with `--config`
///
/// Command-line arguments are applied on top with [`ClipConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Directory holding the point files
/// input_dir: "dmv_data"
///
/// # Extension of the point files
/// extension: "xyz"
///
/// # Where the kept lines are written
/// output: "clip.xyz"
///
/// # Region in the files' coordinate frame, either as bounds or as two corners
/// region:
///   bounds: { min_x: 450000, max_x: 460000, min_y: 100000, max_y: 110000 }
///
/// # Keep one of every N matching points
/// stride: 4
///
/// # Worker count (default: CPU cores)
/// worker_count: 8
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipConfig {
    /// Directory containing the point files
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Extension of the point files, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Output file, replaced on every successful run
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Region to keep. A run without a region is rejected.
    #[serde(default)]
    pub region: Option<RegionSpec>,

    /// Decimation stride; 1 keeps every matching point
    #[serde(default = "default_stride")]
    pub stride: NonZeroUsize,

    /// Maximum number of concurrent workers
    /// Defaults to the number of CPU cores; never more than the file count
    #[serde(default)]
    pub worker_count: Option<NonZeroUsize>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Show a progress bar while files are scanned
    #[serde(default)]
    pub show_progress: bool,
}

/// Values given on the command line; `None` leaves the configured value alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipOverrides {
    pub input_dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub output: Option<PathBuf>,
    pub region: Option<RegionSpec>,
    pub stride: Option<NonZeroUsize>,
    pub worker_count: Option<NonZeroUsize>,
    pub log_level: Option<String>,
    pub show_progress: bool,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_extension() -> String {
    "xyz".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("output.csv")
}

fn default_stride() -> NonZeroUsize {
    NonZeroUsize::MIN
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            extension: default_extension(),
            output: default_output(),
            region: None,
            stride: default_stride(),
            worker_count: None,
            log_level: default_log_level(),
            show_progress: false,
        }
    }
}

impl ClipConfig {
    /// Loads configuration from the default locations
    pub fn load() -> ClipResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus an explicit file
    pub fn load_from(config_path: Option<&Path>) -> ClipResult<Self> {
        if let Some(path) = config_path {
            if !path.is_file() {
                return Err(ClipError::config_error(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("pointclip/config.yaml")),
            // Local config
            Some(PathBuf::from(".pointclip.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        let mut builder = ConfigBuilder::builder();
        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Applies command-line overrides on top of the loaded configuration.
    ///
    /// Only values the user actually passed replace the file values, even when
    /// they equal the built-in defaults.
    pub fn merge_with_cli(mut self, cli: ClipOverrides) -> Self {
        if let Some(input_dir) = cli.input_dir {
            self.input_dir = input_dir;
        }
        if let Some(extension) = cli.extension {
            self.extension = extension;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if cli.region.is_some() {
            self.region = cli.region;
        }
        if let Some(stride) = cli.stride {
            self.stride = stride;
        }
        if cli.worker_count.is_some() {
            self.worker_count = cli.worker_count;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        if cli.show_progress {
            self.show_progress = true;
        }
        self
    }

    /// Requested worker count, falling back to the number of CPU cores
    pub fn max_workers(&self) -> NonZeroUsize {
        self.worker_count
            .or_else(|| NonZeroUsize::new(num_cpus::get()))
            .unwrap_or(NonZeroUsize::MIN)
    }
}
