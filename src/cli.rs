//! Command-line interface components.

use crate::config::Config;
use crate::error::{RangeError, Result};
use crate::timestamps::parse_timestamp;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "data-range-processor")]
#[command(about = "Build depth-binned data-range reports from profiling instrument datasets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Dataset CSV files, or directories searched recursively for them
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory for the range reports
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Directory holding `<refdes>.json` data-review files
    #[arg(long = "metadata-dir", value_name = "PATH")]
    pub metadata_dir: Option<PathBuf>,

    /// CSV table of global ranges (reference_designator,parameter,min,max)
    #[arg(long = "global-ranges", value_name = "FILE")]
    pub global_ranges: Option<PathBuf>,

    /// Root of the curated time_to_exclude directories
    #[arg(long = "exclusion-dir", value_name = "PATH")]
    pub exclusion_dir: Option<PathBuf>,

    /// Review-board notes export
    #[arg(long = "review-export", value_name = "FILE")]
    pub review_export: Option<PathBuf>,

    /// Portal exclusion export
    #[arg(long = "portal-export", value_name = "FILE")]
    pub portal_export: Option<PathBuf>,

    /// Depth cell size in dbar
    #[arg(long = "zcell-size", value_name = "DBAR")]
    pub zcell_size: Option<f64>,

    /// Drop observations at or below this pressure
    #[arg(long = "zdbar", value_name = "DBAR")]
    pub zdbar: Option<f64>,

    /// Standard deviation multiple bounding the outlier band
    #[arg(long = "sigma", value_name = "K")]
    pub sigma: Option<f64>,

    /// Percentile of the per-bin envelope (5 gives 5th/95th)
    #[arg(long = "percentile", value_name = "P")]
    pub percentile: Option<f64>,

    /// Only use observations at or after this time
    #[arg(long = "start", value_name = "TIME", value_parser = parse_cli_timestamp)]
    pub start: Option<DateTime<Utc>>,

    /// Only use observations at or before this time
    #[arg(long = "end", value_name = "TIME", value_parser = parse_cli_timestamp)]
    pub end: Option<DateTime<Utc>>,

    /// Only use files of this deployment number
    #[arg(long = "deployment", value_name = "N")]
    pub deployment: Option<u32>,

    /// Only use files of this delivery method (e.g. recovered_wfp)
    #[arg(long = "method", value_name = "METHOD")]
    pub method: Option<String>,

    /// Re-filter with the sigma-rule windows before building the report
    #[arg(long = "apply-sigma-windows")]
    pub apply_sigma_windows: bool,

    /// Configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

fn parse_cli_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_timestamp(value).map_err(|e| e.to_string())
}

impl Args {
    /// Determine the log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are shown unless quiet
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Config file to load: explicit `--config`, else the default location if present
    pub fn config_file(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(RangeError::configuration(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.clone()));
        }

        let default_path = Config::default_config_path()?;
        Ok(default_path.exists().then_some(default_path))
    }

    /// Layer command-line values over a loaded configuration
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        let pipeline = &mut config.pipeline;
        if let Some(zcell_size) = self.zcell_size {
            pipeline.zcell_size = zcell_size;
        }
        if let Some(zdbar) = self.zdbar {
            pipeline.zdbar = Some(zdbar);
        }
        if let Some(sigma) = self.sigma {
            pipeline.sigma_multiplier = sigma;
        }
        if let Some(percentile) = self.percentile {
            pipeline.percentile = percentile;
        }
        if self.start.is_some() {
            pipeline.start_time = self.start;
        }
        if self.end.is_some() {
            pipeline.end_time = self.end;
        }
        if let Some(deployment) = self.deployment {
            pipeline.deployment = Some(deployment);
        }
        if let Some(method) = &self.method {
            pipeline.method = Some(method.clone());
        }
        if self.apply_sigma_windows {
            pipeline.apply_sigma_windows = true;
        }

        let paths = &mut config.paths;
        if let Some(output_dir) = &self.output_dir {
            paths.output_dir = output_dir.clone();
        }
        if let Some(metadata_dir) = &self.metadata_dir {
            paths.metadata_dir = metadata_dir.clone();
        }
        if let Some(path) = &self.global_ranges {
            paths.global_ranges = Some(path.clone());
        }
        if let Some(path) = &self.exclusion_dir {
            paths.exclusion_dir = Some(path.clone());
        }
        if let Some(path) = &self.review_export {
            paths.review_export = Some(path.clone());
        }
        if let Some(path) = &self.portal_export {
            paths.portal_export = Some(path.clone());
        }

        config
    }

    /// Defaults, then the config file, then command-line overrides, then validation
    pub fn resolve_config(&self) -> Result<Config> {
        let config_file = self.config_file()?;
        let config = Config::load_layered(config_file.as_deref())?;
        let config = self.apply_overrides(config);
        config.validate()?;
        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }
}

/// Set up structured logging to stderr
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("data_range_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}
