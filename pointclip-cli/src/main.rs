use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use pointclip::{
    run_with_cancel, CancelFlag, ClipConfig, ClipOverrides, Region, RegionSpec, RunSummary,
};
use std::{num::NonZeroUsize, path::PathBuf};
use tracing_subscriber::EnvFilter;

/// Keep the points of XYZ tiles that fall inside a region
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Region as 'minX,maxX,minY,maxY' in the tiles' coordinate frame
    #[arg(short, long, value_parser = parse_bounds, allow_hyphen_values = true)]
    bbox: Option<Region>,

    /// Region as two opposite corners 'x1,y1,x2,y2'
    #[arg(long, value_parser = parse_corners, allow_hyphen_values = true, conflicts_with = "bbox")]
    corners: Option<Region>,

    /// Directory containing the point files [default: data]
    #[arg(short = 'd', long = "data")]
    data: Option<PathBuf>,

    /// Extension of the point files [default: xyz]
    #[arg(short, long)]
    extension: Option<String>,

    /// Output file [default: output.csv]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep one out of every N matching points [default: 1]
    #[arg(short, long)]
    stride: Option<NonZeroUsize>,

    /// Number of worker threads (default: CPU cores)
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: warn]
    #[arg(long)]
    log_level: Option<String>,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn parse_bounds(s: &str) -> std::result::Result<Region, String> {
    s.parse::<Region>().map_err(|e| e.to_string())
}

fn parse_corners(s: &str) -> std::result::Result<Region, String> {
    Region::parse_corners(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Only the flags that were actually passed
    fn overrides(&self) -> ClipOverrides {
        ClipOverrides {
            input_dir: self.data.clone(),
            extension: self.extension.clone(),
            output: self.output.clone(),
            region: self.bbox.or(self.corners).map(RegionSpec::from),
            stride: self.stride,
            worker_count: self.threads,
            log_level: self.log_level.clone(),
            show_progress: self.progress,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ClipConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?
        .merge_with_cli(cli.overrides());

    init_logging(&config.log_level);
    tracing::debug!("Effective configuration: {:?}", config);

    let cancel = CancelFlag::new();
    install_interrupt_handler(&cancel)?;

    let summary = run_with_cancel(&config, &cancel).with_context(|| {
        format!(
            "clipping {} into {} failed",
            config.input_dir.display(),
            config.output.display()
        )
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// First Ctrl-C stops new files from being picked up; a second one exits
/// immediately with the conventional status 130.
fn install_interrupt_handler(cancel: &CancelFlag) -> Result<()> {
    use signal_hook::consts::SIGINT;

    // Registered first so it sees the flag before this signal sets it
    signal_hook::flag::register_conditional_shutdown(SIGINT, 130, cancel.as_arc())
        .context("failed to install Ctrl-C handler")?;
    signal_hook::flag::register(SIGINT, cancel.as_arc())
        .context("failed to install Ctrl-C handler")?;
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &RunSummary) {
    let totals = &summary.totals;
    println!(
        "Processed rows: {}",
        totals.total_rows_seen.to_string().green()
    );
    println!(
        "Kept {} rows in {} from {} files using {} workers",
        totals.rows_written.to_string().green(),
        summary.output.display().to_string().blue(),
        summary.files_found,
        summary.workers
    );
    if totals.rows_malformed > 0 {
        println!(
            "{} malformed rows ignored",
            totals.rows_malformed.to_string().yellow()
        );
    }
    if totals.files_failed > 0 {
        println!(
            "{} files could not be read",
            totals.files_failed.to_string().red()
        );
    }
    println!("Finished in {} ms", summary.elapsed_ms);
}
