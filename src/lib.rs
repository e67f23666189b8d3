//! Data Range Processor Library
//!
//! A Rust library for reducing profiling oceanographic instrument time series
//! to depth-binned data-range reports for automated quality review.
//!
//! This library provides tools for:
//! - Reading per-deployment dataset exports and their data-review metadata
//! - Rejecting fill, NaN, extreme, out-of-range, excluded-time and too-deep samples
//! - Grouping trusted samples into fixed-width depth bins with descriptive statistics
//! - Flagging time windows whose values fall outside a sigma band within a bin
//! - Writing one range report per reference designator

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod processor;
pub mod sources;
pub mod timestamps;

// Re-export commonly used types
pub use config::{Config, PipelineConfig};
pub use error::{RangeError, Result};
pub use models::{
    BinStatistics, DatasetFile, DepthBin, ExclusionWindow, Observation, ObservationSet,
    ProcessingStats, RangeReportRow, ReferenceDesignator, WindowSource,
};
pub use processor::RangeProcessor;
pub use processor::binning::{DepthBinning, bin_observations};
pub use processor::filter::{
    FilterOutcome, FilterStage, apply_quality_filters, apply_sigma_windows, apply_windows,
};
pub use processor::outliers::{OutlierScan, detect_outlier_windows};
pub use processor::pipeline::{VariableReduction, reduce_variable};
pub use processor::report::RangeReport;
