//! Exclusion window sources
//!
//! Three independent sources name time ranges whose observations must be
//! dropped regardless of their values:
//!
//! - curated per-variable CSVs under
//!   `<root>/<array>/<subsite>/<refdes>/time_to_exclude/`
//! - the review-board notes export (`type == exclusion` rows)
//! - the portal exclusion export
//!
//! Every source is optional. A missing file or directory yields no windows.

use crate::constants::{REVIEW_EXCLUSION_TYPE, TIME_TO_EXCLUDE_DIR};
use crate::error::{RangeError, Result};
use crate::models::{ExclusionWindow, ReferenceDesignator, WindowSource};
use crate::sources::ExclusionSource;
use crate::sources::frame::{first_string_column, has_column, read_csv, string_column};
use crate::timestamps::{parse_time_span, parse_timestamp};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Curated per-variable exclusion files of one designator
#[derive(Debug, Clone, Default)]
pub struct LocalExclusionFiles {
    entries: Vec<(String, ExclusionWindow)>,
}

impl LocalExclusionFiles {
    /// Directory holding the curated files of `refdes`
    pub fn directory(root: &Path, refdes: &ReferenceDesignator) -> PathBuf {
        root.join(refdes.array())
            .join(&refdes.subsite)
            .join(refdes.to_string())
            .join(TIME_TO_EXCLUDE_DIR)
    }

    /// Load every non-hidden file in the designator's `time_to_exclude` directory
    ///
    /// Each file has a variable column (`parameter`, or the first column when
    /// unnamed) and a `time_to_exclude` column of comma-separated instants,
    /// dates or `start/end` ranges.
    pub fn load(root: &Path, refdes: &ReferenceDesignator) -> Result<Self> {
        let dir = Self::directory(root, refdes);
        if !dir.is_dir() {
            debug!("No curated exclusion directory at {}", dir.display());
            return Ok(Self::default());
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .map(|e| e.into_path())
            .collect();
        files.sort();

        let mut loaded = Self::default();
        for file in &files {
            loaded.entries.extend(Self::read_file(file)?);
        }

        info!(
            "Loaded {} curated exclusion entries from {} files in {}",
            loaded.entries.len(),
            files.len(),
            dir.display()
        );
        Ok(loaded)
    }

    fn read_file(path: &Path) -> Result<Vec<(String, ExclusionWindow)>> {
        let df = read_csv(path)?;
        let variables = if has_column(&df, "parameter") {
            string_column(&df, "parameter")?
        } else {
            first_string_column(&df)?
        }
        .ok_or_else(|| RangeError::invalid_format(path, "no variable column"))?;
        let times = string_column(&df, "time_to_exclude")?
            .ok_or_else(|| RangeError::missing_column(path, "time_to_exclude"))?;

        let mut entries = Vec::new();
        for (variable, time_list) in variables.into_iter().zip(times) {
            let (Some(variable), Some(time_list)) = (variable, time_list) else {
                continue;
            };
            for item in time_list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                match parse_time_span(item) {
                    Ok((start, end)) => entries.push((
                        variable.clone(),
                        ExclusionWindow::new(start, end, WindowSource::LocalCsv),
                    )),
                    Err(e) => warn!(
                        "Skipping exclusion entry '{}' for {} in {}: {}",
                        item,
                        variable,
                        path.display(),
                        e
                    ),
                }
            }
        }
        Ok(entries)
    }

    pub fn from_entries(entries: Vec<(String, ExclusionWindow)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExclusionSource for LocalExclusionFiles {
    fn source(&self) -> WindowSource {
        WindowSource::LocalCsv
    }

    fn windows(&self, _refdes: &ReferenceDesignator, variable: &str) -> Vec<ExclusionWindow> {
        self.entries
            .iter()
            .filter(|(name, _)| name == variable)
            .map(|(_, window)| *window)
            .collect()
    }
}

/// A designator-scoped window row shared by the review-board and portal exports
#[derive(Debug, Clone, PartialEq)]
struct DesignatorWindow {
    designator: String,
    parameter: Option<String>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DesignatorWindow {
    fn applies_to(&self, refdes: &ReferenceDesignator, variable: &str) -> bool {
        refdes.matches_review_designator(&self.designator)
            && self.parameter.as_deref().is_none_or(|p| p == variable)
    }
}

/// Read `reference_designator,start_date,end_date[,parameter][,type]` rows
///
/// When `required_type` is given only rows whose `type` matches are kept.
/// An empty `end_date` leaves the window open-ended.
fn load_designator_windows(
    path: &Path,
    required_type: Option<&str>,
) -> Result<Vec<DesignatorWindow>> {
    let df = read_csv(path)?;
    let designators = string_column(&df, "reference_designator")?
        .ok_or_else(|| RangeError::missing_column(path, "reference_designator"))?;
    let starts = string_column(&df, "start_date")?
        .ok_or_else(|| RangeError::missing_column(path, "start_date"))?;
    let ends = string_column(&df, "end_date")?
        .ok_or_else(|| RangeError::missing_column(path, "end_date"))?;
    let parameters = string_column(&df, "parameter")?.unwrap_or_else(|| vec![None; df.height()]);
    let types = match required_type {
        Some(_) => Some(
            string_column(&df, "type")?.ok_or_else(|| RangeError::missing_column(path, "type"))?,
        ),
        None => None,
    };

    let mut rows = Vec::new();
    for (i, designator) in designators.into_iter().enumerate() {
        if let (Some(required), Some(types)) = (required_type, &types) {
            let matches = types[i]
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(required));
            if !matches {
                continue;
            }
        }
        let Some(designator) = designator else {
            continue;
        };
        let Some(start_raw) = starts[i].as_deref() else {
            warn!(
                "Skipping window for {} in {}: no start_date",
                designator,
                path.display()
            );
            continue;
        };
        let start = match parse_timestamp(start_raw) {
            Ok(start) => start,
            Err(e) => {
                warn!("Skipping window for {} in {}: {}", designator, path.display(), e);
                continue;
            }
        };
        let end = match ends[i].as_deref() {
            Some(raw) => match parse_timestamp(raw) {
                Ok(end) => end,
                Err(e) => {
                    warn!("Skipping window for {} in {}: {}", designator, path.display(), e);
                    continue;
                }
            },
            None => DateTime::<Utc>::MAX_UTC,
        };

        rows.push(DesignatorWindow {
            designator,
            parameter: parameters[i].clone(),
            start,
            end,
        });
    }
    Ok(rows)
}

/// Review-board notes export
#[derive(Debug, Clone, Default)]
pub struct ReviewBoardExport {
    rows: Vec<DesignatorWindow>,
}

impl ReviewBoardExport {
    /// Load the export once per run; a missing file yields no windows
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Review-board export not found at {}", path.display());
            return Ok(Self::default());
        }
        let rows = load_designator_windows(path, Some(REVIEW_EXCLUSION_TYPE))?;
        info!(
            "Loaded {} review-board exclusions from {}",
            rows.len(),
            path.display()
        );
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ExclusionSource for ReviewBoardExport {
    fn source(&self) -> WindowSource {
        WindowSource::ReviewBoard
    }

    fn windows(&self, refdes: &ReferenceDesignator, variable: &str) -> Vec<ExclusionWindow> {
        self.rows
            .iter()
            .filter(|row| row.applies_to(refdes, variable))
            .map(|row| ExclusionWindow::new(row.start, row.end, WindowSource::ReviewBoard))
            .collect()
    }
}

/// Portal exclusion export
#[derive(Debug, Clone, Default)]
pub struct PortalExport {
    rows: Vec<DesignatorWindow>,
}

impl PortalExport {
    /// Load the export once per run; a missing file yields no windows
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Portal export not found at {}", path.display());
            return Ok(Self::default());
        }
        let rows = load_designator_windows(path, None)?;
        info!(
            "Loaded {} portal exclusions from {}",
            rows.len(),
            path.display()
        );
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ExclusionSource for PortalExport {
    fn source(&self) -> WindowSource {
        WindowSource::PortalExport
    }

    fn windows(&self, refdes: &ReferenceDesignator, variable: &str) -> Vec<ExclusionWindow> {
        self.rows
            .iter()
            .filter(|row| row.applies_to(refdes, variable))
            .map(|row| ExclusionWindow::new(row.start, row.end, WindowSource::PortalExport))
            .collect()
    }
}

/// Union of every configured exclusion source
#[derive(Default)]
pub struct ExclusionSources<'a> {
    sources: Vec<&'a dyn ExclusionSource>,
}

impl<'a> ExclusionSources<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: &'a dyn ExclusionSource) -> Self {
        self.sources.push(source);
        self
    }

    /// All windows for `variable`, in source order
    pub fn collect(&self, refdes: &ReferenceDesignator, variable: &str) -> Vec<ExclusionWindow> {
        let mut windows = Vec::new();
        for source in &self.sources {
            let found = source.windows(refdes, variable);
            debug!(
                "{} exclusion windows for {} from {}",
                found.len(),
                variable,
                source.source()
            );
            windows.extend(found);
        }
        windows
    }
}
