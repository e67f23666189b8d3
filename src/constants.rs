//! Application constants for the data-range processor
//!
//! This module contains the fixed thresholds, default values, file naming
//! conventions and column names used throughout the processor.

// =============================================================================
// Quality Filter Constants
// =============================================================================

/// Values with a magnitude above this are treated as corrupt sensor bytes
pub const EXTREME_VALUE_THRESHOLD: f64 = 1e7;

/// Default multiple of the standard deviation bounding the in-bin value band
pub const DEFAULT_SIGMA_MULTIPLIER: f64 = 3.0;

/// Default percentile for the upper/lower plotting envelope
pub const DEFAULT_PERCENTILE: f64 = 5.0;

// =============================================================================
// Depth Binning Constants
// =============================================================================

/// Default depth cell size in dbar
pub const DEFAULT_ZCELL_SIZE: f64 = 10.0;

/// Minimum bin population for which a standard deviation is defined
pub const MIN_COUNT_FOR_STD: usize = 2;

/// Upper limit on the bins of one variable
///
/// A depth span needing more bins than this comes from unflagged fill or
/// corrupt pressures, and the variable is left unbinned.
pub const MAX_DEPTH_BINS: usize = 100_000;

// =============================================================================
// Dataset Conventions
// =============================================================================

/// Name of the timestamp column in exported dataset files
pub const TIME_COLUMN: &str = "time";

/// Pressure columns tried in order when locating the depth axis
///
/// Glider CTDs carry `sci_water_pressure_dbar`, other glider instruments
/// `int_ctd_pressure`. Profiler instruments use a generic pressure variable.
pub const DEFAULT_PRESSURE_CANDIDATES: &[&str] = &[
    "sci_water_pressure_dbar",
    "int_ctd_pressure",
    "ctdpf_ckl_seawater_pressure",
    "pressure_depth",
    "pressure",
];

/// Placeholder used when the pressure variable carries no units
pub const PRESSURE_UNITS_MISSING: &str = "pressure unit missing";

/// Data product type that marks a stream parameter as a science variable
pub const SCIENCE_DATA_PRODUCT_TYPE: &str = "Science Data";

/// Subdirectory holding curated per-variable exclusion CSVs
pub const TIME_TO_EXCLUDE_DIR: &str = "time_to_exclude";

/// Review-board note type that marks an exclusion window
pub const REVIEW_EXCLUSION_TYPE: &str = "exclusion";

// =============================================================================
// Output Naming
// =============================================================================

/// Suffix of the per-designator range report file
pub const DATA_RANGES_SUFFIX: &str = "_data_ranges.csv";

/// Suffix of the per-designator sigma window file
pub const SIGMA_WINDOWS_SUFFIX: &str = "_sigma_windows.csv";

/// Decimal places written for floating-point report columns
pub const REPORT_FLOAT_PRECISION: usize = 6;

/// Report column headers in output order
pub mod report_columns {
    pub const PARAMETER: &str = "parameter";
    pub const DEPLOYMENTS: &str = "deployments";
    pub const DEPTH_BIN: &str = "depth_bin";
    pub const COUNT: &str = "count";
    pub const MEAN: &str = "mean";
    pub const STD: &str = "std";
    pub const MIN: &str = "min";
    pub const Q25: &str = "25%";
    pub const Q50: &str = "50%";
    pub const Q75: &str = "75%";
    pub const MAX: &str = "max";
}

// =============================================================================
// Configuration Defaults
// =============================================================================

/// Directory name under the user config dir holding `config.toml`
pub const CONFIG_DIR_NAME: &str = "data-range-processor";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default output directory for reports
pub const DEFAULT_OUTPUT_DIR: &str = "./data_ranges";

/// Default directory holding `<refdes>.json` data-review files
pub const DEFAULT_METADATA_DIR: &str = "./metadata";
