//! Configuration management and validation.
//!
//! Provides the pipeline parameters threaded through every filtering and
//! binning call, plus the locations of the external inputs. Configuration is
//! layered: built-in defaults, then an optional TOML file, then command-line
//! overrides, then validation.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_METADATA_DIR, DEFAULT_OUTPUT_DIR,
    DEFAULT_PERCENTILE, DEFAULT_PRESSURE_CANDIDATES, DEFAULT_SIGMA_MULTIPLIER, DEFAULT_ZCELL_SIZE,
    EXTREME_VALUE_THRESHOLD,
};
use crate::error::{RangeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parameters of the filter, binning and outlier stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Depth cell size in dbar
    pub zcell_size: f64,

    /// Drop observations at or below this pressure when set
    pub zdbar: Option<f64>,

    /// Multiple of the bin standard deviation bounding the accepted band
    pub sigma_multiplier: f64,

    /// Percentile of the per-bin plotting envelope (5 gives 5th/95th)
    pub percentile: f64,

    /// Magnitude above which values are rejected as corrupt
    pub extreme_value_threshold: f64,

    /// Only read observations at or after this instant
    pub start_time: Option<DateTime<Utc>>,

    /// Only read observations at or before this instant
    pub end_time: Option<DateTime<Utc>>,

    /// Only read files of this deployment number
    pub deployment: Option<u32>,

    /// Only read files of this delivery method (e.g. `recovered_wfp`)
    pub method: Option<String>,

    /// Re-filter with the sigma-rule windows before building the report
    pub apply_sigma_windows: bool,

    /// Include pressure variables in the range report
    pub report_pressure_variables: bool,

    /// Pressure columns tried in order for the depth axis
    pub pressure_candidates: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zcell_size: DEFAULT_ZCELL_SIZE,
            zdbar: None,
            sigma_multiplier: DEFAULT_SIGMA_MULTIPLIER,
            percentile: DEFAULT_PERCENTILE,
            extreme_value_threshold: EXTREME_VALUE_THRESHOLD,
            start_time: None,
            end_time: None,
            deployment: None,
            method: None,
            apply_sigma_windows: false,
            report_pressure_variables: false,
            pressure_candidates: DEFAULT_PRESSURE_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Set the depth cell size
    pub fn with_zcell_size(mut self, zcell_size: f64) -> Self {
        self.zcell_size = zcell_size;
        self
    }

    /// Set the maximum retained pressure
    pub fn with_zdbar(mut self, zdbar: f64) -> Self {
        self.zdbar = Some(zdbar);
        self
    }

    /// Set the sigma multiplier of the outlier band
    pub fn with_sigma_multiplier(mut self, sigma_multiplier: f64) -> Self {
        self.sigma_multiplier = sigma_multiplier;
        self
    }

    /// Restrict reading to a time range
    pub fn with_time_range(
        mut self,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Restrict reading to one deployment
    pub fn with_deployment(mut self, deployment: u32) -> Self {
        self.deployment = Some(deployment);
        self
    }

    /// Restrict reading to one delivery method
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Apply sigma-rule windows in a second pass before reporting
    pub fn with_sigma_pass(mut self) -> Self {
        self.apply_sigma_windows = true;
        self
    }

    /// True when `timestamp` lies inside the configured time range
    pub fn in_time_range(&self, timestamp: DateTime<Utc>) -> bool {
        self.start_time.is_none_or(|start| timestamp >= start)
            && self.end_time.is_none_or(|end| timestamp <= end)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.zcell_size.is_finite() && self.zcell_size > 0.0) {
            return Err(RangeError::configuration(format!(
                "zcell_size must be a positive number, got {}",
                self.zcell_size
            )));
        }
        if !(self.sigma_multiplier.is_finite() && self.sigma_multiplier > 0.0) {
            return Err(RangeError::configuration(format!(
                "sigma_multiplier must be a positive number, got {}",
                self.sigma_multiplier
            )));
        }
        if !(self.percentile > 0.0 && self.percentile < 50.0) {
            return Err(RangeError::configuration(format!(
                "percentile must lie in (0, 50), got {}",
                self.percentile
            )));
        }
        if !(self.extreme_value_threshold.is_finite() && self.extreme_value_threshold > 0.0) {
            return Err(RangeError::configuration(
                "extreme_value_threshold must be finite and positive",
            ));
        }
        if let Some(zdbar) = self.zdbar {
            if !zdbar.is_finite() {
                return Err(RangeError::configuration("zdbar must be finite"));
            }
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(RangeError::configuration(format!(
                    "start_time {start} is after end_time {end}"
                )));
            }
        }
        if self.pressure_candidates.is_empty() {
            return Err(RangeError::configuration(
                "at least one pressure column candidate is required",
            ));
        }
        Ok(())
    }
}

/// Locations of external inputs and outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Reports are written under `<output_dir>/<array>/<subsite>/`
    pub output_dir: PathBuf,

    /// Directory holding `<refdes>.json` data-review files
    pub metadata_dir: PathBuf,

    /// CSV table of global ranges
    pub global_ranges: Option<PathBuf>,

    /// Root of the curated `time_to_exclude` directories
    pub exclusion_dir: Option<PathBuf>,

    /// Review-board notes export
    pub review_export: Option<PathBuf>,

    /// Portal exclusion export
    pub portal_export: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            metadata_dir: PathBuf::from(DEFAULT_METADATA_DIR),
            global_ranges: None,
            exclusion_dir: None,
            review_export: None,
            portal_export: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub paths: PathsConfig,
}

impl Config {
    /// Default config file location (`<config dir>/data-range-processor/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RangeError::configuration("Could not determine user config directory"))?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load defaults, then overlay the TOML file if one is given
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let config = match config_file {
            Some(path) => {
                info!("Using config file: {}", path.display());
                let contents = std::fs::read_to_string(path)?;
                Self::from_toml_str(&contents)?
            }
            None => {
                info!("No config file found, using defaults");
                Self::default()
            }
        };
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()
    }

    /// Create the output directory if it doesn't exist
    pub fn ensure_output_directory(&self) -> Result<()> {
        if !self.paths.output_dir.exists() {
            std::fs::create_dir_all(&self.paths.output_dir).map_err(|e| {
                RangeError::configuration(format!(
                    "Failed to create output directory '{}': {}",
                    self.paths.output_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
