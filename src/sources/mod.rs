//! External collaborators of the filtering and binning core
//!
//! The core only sees these traits. File-backed implementations are provided
//! for each so the processor can run end-to-end:
//!
//! - [`dataset`] - CSV exports of instrument streams, one file per deployment
//! - [`metadata`] - per-designator data-review catalog (deployments, science variables)
//! - [`global_ranges`] - CSV table of per-variable global ranges
//! - [`exclusions`] - curated, review-board and portal exclusion windows
//! - [`frame`] - polars helpers shared by the CSV-backed sources

pub mod dataset;
pub mod exclusions;
pub mod frame;
pub mod global_ranges;
pub mod metadata;

#[cfg(test)]
pub mod tests;

use crate::error::Result;
use crate::models::{
    DatasetFile, DeploymentInfo, ExclusionWindow, ReferenceDesignator, ScienceVariable,
    WindowSource,
};

pub use dataset::{CsvDatasetReader, LoadedDataset, PressureAxis, VariableSeries};
pub use exclusions::{ExclusionSources, LocalExclusionFiles, PortalExport, ReviewBoardExport};
pub use global_ranges::GlobalRangeTable;
pub use metadata::DataReviewCatalog;

/// Reads one science variable from a dataset file
pub trait DatasetReader {
    /// Returns `Ok(None)` when the file does not carry `variable`
    fn read_variable(
        &self,
        file: &DatasetFile,
        variable: &ScienceVariable,
    ) -> Result<Option<VariableSeries>>;
}

/// Looks up the configured `[min, max]` for a variable
pub trait GlobalRangeLookup {
    fn global_range(&self, refdes: &ReferenceDesignator, variable: &str) -> Option<(f64, f64)>;
}

/// Looks up deployment metadata
pub trait DeploymentLookup {
    fn deployment(&self, refdes: &ReferenceDesignator, deployment: u32) -> Option<DeploymentInfo>;
}

/// Supplies exclusion windows for a variable
pub trait ExclusionSource {
    fn source(&self) -> WindowSource;

    fn windows(&self, refdes: &ReferenceDesignator, variable: &str) -> Vec<ExclusionWindow>;
}

/// Lookup used when no global range table is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGlobalRanges;

impl GlobalRangeLookup for NoGlobalRanges {
    fn global_range(&self, _refdes: &ReferenceDesignator, _variable: &str) -> Option<(f64, f64)> {
        None
    }
}
