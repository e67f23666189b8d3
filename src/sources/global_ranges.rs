//! Global range table
//!
//! CSV with columns `reference_designator,parameter,min,max`. Rows whose
//! bounds are not numeric are ignored, leaving that variable without a range.

use crate::error::{RangeError, Result};
use crate::models::ReferenceDesignator;
use crate::sources::GlobalRangeLookup;
use crate::sources::frame::{float_column, read_csv, string_column};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct GlobalRangeTable {
    ranges: HashMap<(String, String), (f64, f64)>,
}

impl GlobalRangeTable {
    /// Load the table; a missing file yields an empty table
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Global range table not found at {} - global range stage disabled",
                path.display()
            );
            return Ok(Self::default());
        }

        let df = read_csv(path)?;
        let refdes = string_column(&df, "reference_designator")?
            .ok_or_else(|| RangeError::missing_column(path, "reference_designator"))?;
        let parameters = string_column(&df, "parameter")?
            .ok_or_else(|| RangeError::missing_column(path, "parameter"))?;
        let mins =
            float_column(&df, "min")?.ok_or_else(|| RangeError::missing_column(path, "min"))?;
        let maxs =
            float_column(&df, "max")?.ok_or_else(|| RangeError::missing_column(path, "max"))?;

        let mut table = Self::default();
        for (((refdes, parameter), min), max) in
            refdes.into_iter().zip(parameters).zip(mins).zip(maxs)
        {
            let (Some(refdes), Some(parameter)) = (refdes, parameter) else {
                continue;
            };
            if !(min.is_finite() && max.is_finite()) {
                debug!(
                    "Ignoring non-numeric global range for {} {}",
                    refdes, parameter
                );
                continue;
            }
            table.insert(refdes, parameter, min, max);
        }

        info!(
            "Loaded {} global ranges from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn insert(
        &mut self,
        refdes: impl Into<String>,
        parameter: impl Into<String>,
        min: f64,
        max: f64,
    ) {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.ranges
            .insert((refdes.into(), parameter.into()), (min, max));
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl GlobalRangeLookup for GlobalRangeTable {
    fn global_range(&self, refdes: &ReferenceDesignator, variable: &str) -> Option<(f64, f64)> {
        self.ranges
            .get(&(refdes.to_string(), variable.to_string()))
            .copied()
    }
}
