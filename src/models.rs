//! Core data structures and types for data-range processing.
//!
//! Defines observations and observation sets, exclusion windows, depth bins,
//! per-bin statistics, report rows, reference designators and the metadata
//! records supplied by the external lookups.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{RangeError, Result};

/// A single sensor sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    /// Pressure in dbar, used as depth
    pub depth: f64,
    pub value: f64,
    /// True when `value` equals the variable's fill value
    pub is_fill: bool,
    /// Deployment number of the file this sample was read from
    pub deployment: u32,
}

impl Observation {
    /// Create an observation, flagging it as fill when `value == fill_value`
    pub fn new(
        timestamp: DateTime<Utc>,
        depth: f64,
        value: f64,
        fill_value: Option<f64>,
        deployment: u32,
    ) -> Self {
        Self {
            timestamp,
            depth,
            value,
            is_fill: fill_value.is_some_and(|fv| value == fv),
            deployment,
        }
    }
}

/// Ordered observations of one science variable
///
/// Sets are never mutated once built; filtering produces a new set that
/// preserves the input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSet {
    pub variable: String,
    pub units: String,
    pub fill_value: Option<f64>,
    observations: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(
        variable: impl Into<String>,
        units: impl Into<String>,
        fill_value: Option<f64>,
        observations: Vec<Observation>,
    ) -> Self {
        Self {
            variable: variable.into(),
            units: units.into(),
            fill_value,
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    /// Build a new set holding only the observations that satisfy `keep`
    pub fn filtered<F>(&self, keep: F) -> Self
    where
        F: Fn(&Observation) -> bool,
    {
        Self {
            variable: self.variable.clone(),
            units: self.units.clone(),
            fill_value: self.fill_value,
            observations: self.observations.iter().filter(|o| keep(o)).copied().collect(),
        }
    }

    /// Build a new set with the same variable metadata and other observations
    pub fn with_observations(&self, observations: Vec<Observation>) -> Self {
        Self {
            variable: self.variable.clone(),
            units: self.units.clone(),
            fill_value: self.fill_value,
            observations,
        }
    }

    /// Sorted, de-duplicated deployment numbers present in the set
    pub fn deployments(&self) -> Vec<u32> {
        let mut deployments: Vec<u32> = self.observations.iter().map(|o| o.deployment).collect();
        deployments.sort_unstable();
        deployments.dedup();
        deployments
    }

    /// True when every value is NaN
    pub fn all_nan(&self) -> bool {
        self.observations.iter().all(|o| o.value.is_nan())
    }

    /// True when every value is the fill value
    pub fn all_fill(&self) -> bool {
        self.observations.iter().all(|o| o.is_fill)
    }
}

/// Origin of an exclusion window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
    LocalCsv,
    PortalExport,
    ReviewBoard,
    SigmaRule,
}

impl WindowSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowSource::LocalCsv => "local_csv",
            WindowSource::PortalExport => "portal_export",
            WindowSource::ReviewBoard => "review_board",
            WindowSource::SigmaRule => "sigma_rule",
        }
    }
}

impl fmt::Display for WindowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed time interval whose observations must be dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub source: WindowSource,
}

impl ExclusionWindow {
    /// Create a window; reversed bounds are swapped
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, source: WindowSource) -> Self {
        if start <= end {
            Self { start, end, source }
        } else {
            Self {
                start: end,
                end: start,
                source,
            }
        }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Half-open depth interval `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthBin {
    pub lower: f64,
    pub upper: f64,
}

impl DepthBin {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, depth: f64) -> bool {
        self.lower <= depth && depth < self.upper
    }
}

impl fmt::Display for DepthBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lower, self.upper)
    }
}

/// Descriptive statistics of the values falling in one depth bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinStatistics {
    pub bin: DepthBin,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, undefined below two members
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
    /// Mean depth of the members, used to place plot overlays
    pub depth_mean: f64,
    /// Lower and upper percentile of the values at the configured percentile
    pub percentile_envelope: (f64, f64),
}

/// One row of the per-designator range report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeReportRow {
    pub parameter: String,
    /// Sorted, comma-joined deployment numbers
    pub deployments: String,
    pub bin: DepthBin,
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl RangeReportRow {
    pub fn from_statistics(parameter: &str, deployments: &[u32], stats: &BinStatistics) -> Self {
        Self {
            parameter: parameter.to_string(),
            deployments: join_deployments(deployments),
            bin: stats.bin,
            count: stats.count,
            mean: stats.mean,
            std: stats.std,
            min: stats.min,
            q25: stats.q25,
            q50: stats.q50,
            q75: stats.q75,
            max: stats.max,
        }
    }
}

/// Join deployment numbers as `"1, 2, 7"`
pub fn join_deployments(deployments: &[u32]) -> String {
    let mut sorted = deployments.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

static REFDES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z0-9]{8})-([A-Z0-9]{5})-([0-9A-Z]{2})-([A-Z0-9]{9})$")
        .expect("reference designator pattern is valid")
});

static DATASET_FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^deployment(\d{4})_([A-Z0-9]{8}-[A-Z0-9]{5}-[0-9A-Z]{2}-[A-Z0-9]{9})-([a-z_]+)-([A-Za-z0-9_]+?)(?:_\d{8}T\d{6}(?:\.\d+)?-\d{8}T\d{6}(?:\.\d+)?)?\.csv$",
    )
    .expect("dataset file pattern is valid")
});

/// Instrument/platform identifier, e.g. `CE09OSPM-WFP01-04-FLORTK000`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceDesignator {
    pub subsite: String,
    pub node: String,
    pub port: String,
    pub instrument: String,
}

impl ReferenceDesignator {
    pub fn parse(value: &str) -> Result<Self> {
        let caps = REFDES_PATTERN.captures(value.trim()).ok_or_else(|| {
            RangeError::configuration(format!("Invalid reference designator: {value}"))
        })?;
        Ok(Self {
            subsite: caps[1].to_string(),
            node: caps[2].to_string(),
            port: caps[3].to_string(),
            instrument: caps[4].to_string(),
        })
    }

    /// First two characters of the subsite, e.g. `CE`
    pub fn array(&self) -> &str {
        self.subsite.get(..2).unwrap_or(&self.subsite)
    }

    pub fn subsite_node(&self) -> String {
        format!("{}-{}", self.subsite, self.node)
    }

    /// Review tables may name the subsite, the subsite-node or the full designator
    pub fn matches_review_designator(&self, value: &str) -> bool {
        let value = value.trim();
        value == self.subsite || value == self.subsite_node() || value == self.to_string()
    }
}

impl fmt::Display for ReferenceDesignator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.subsite, self.node, self.port, self.instrument
        )
    }
}

/// A dataset export file and the identity encoded in its name
///
/// Names follow `deployment0007_<refdes>-<method>-<stream>[_<start>-<end>].csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFile {
    pub path: PathBuf,
    pub deployment: u32,
    pub refdes: ReferenceDesignator,
    pub method: String,
    pub stream: String,
}

impl DatasetFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let unrecognised = || RangeError::UnrecognisedFileName {
            path: path.to_path_buf(),
        };
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(unrecognised)?;
        let caps = DATASET_FILE_PATTERN
            .captures(file_name)
            .ok_or_else(unrecognised)?;

        let deployment = caps[1].parse::<u32>().map_err(|_| unrecognised())?;
        Ok(Self {
            path: path.to_path_buf(),
            deployment,
            refdes: ReferenceDesignator::parse(&caps[2])?,
            method: caps[3].to_string(),
            stream: caps[4].to_string(),
        })
    }

    /// `method-stream` key used by the data-review catalog
    pub fn method_stream(&self) -> String {
        format!("{}-{}", self.method, self.stream)
    }
}

/// A science variable listed for a stream in the data-review catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScienceVariable {
    pub name: String,
    pub units: String,
    pub fill_value: Option<f64>,
}

impl ScienceVariable {
    pub fn is_pressure(&self) -> bool {
        self.name.to_lowercase().contains("pressure")
    }
}

/// Deployment metadata from the data-review catalog
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentInfo {
    pub deployment_number: u32,
    pub start_date: Option<DateTime<Utc>>,
    pub stop_date: Option<DateTime<Utc>>,
    pub deployment_depth: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Run-level processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub designators_processed: usize,
    pub designators_failed: usize,
    pub variables_reported: usize,
    pub variables_skipped: usize,
    pub rows_written: usize,
    pub sigma_windows: usize,
    pub output_paths: Vec<PathBuf>,
    pub processing_time_ms: u128,
}
