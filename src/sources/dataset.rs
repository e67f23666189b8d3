//! CSV dataset reader
//!
//! Each dataset export holds one deployment of one `method-stream`, with a
//! `time` column, one or more pressure columns and the stream's parameters.

use crate::constants::{PRESSURE_UNITS_MISSING, TIME_COLUMN};
use crate::error::{RangeError, Result};
use crate::models::{DatasetFile, Observation, ObservationSet, ScienceVariable};
use crate::sources::DatasetReader;
use crate::sources::frame::{float_column, read_csv, string_column};
use crate::timestamps::parse_timestamp;
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The pressure column used as the depth axis
#[derive(Debug, Clone, PartialEq)]
pub struct PressureAxis {
    pub column: String,
    pub units: String,
}

/// Observations of one variable read from one file
#[derive(Debug, Clone)]
pub struct VariableSeries {
    pub observations: ObservationSet,
    pub pressure: PressureAxis,
}

#[derive(Debug, Clone)]
pub struct CsvDatasetReader {
    pressure_candidates: Vec<String>,
    parameters: HashMap<String, ScienceVariable>,
}

impl CsvDatasetReader {
    pub fn new(pressure_candidates: Vec<String>) -> Self {
        Self {
            pressure_candidates,
            parameters: HashMap::new(),
        }
    }

    /// Units and fill values of every stream parameter, used for the pressure axis
    pub fn with_parameter_metadata(
        mut self,
        parameters: impl IntoIterator<Item = ScienceVariable>,
    ) -> Self {
        self.parameters
            .extend(parameters.into_iter().map(|p| (p.name.clone(), p)));
        self
    }

    fn pressure_units(&self, column: &str) -> String {
        match self.parameters.get(column) {
            Some(p) if !p.units.trim().is_empty() => p.units.clone(),
            _ => {
                info!(
                    "No units for pressure column {}, using '{}'",
                    column, PRESSURE_UNITS_MISSING
                );
                PRESSURE_UNITS_MISSING.to_string()
            }
        }
    }

    /// Pick the first candidate column that carries real pressures
    ///
    /// A column whose values are all zero, NaN or fill is degenerate and the
    /// next candidate is tried. When every present candidate is degenerate the
    /// first one is kept. Depths equal to the column's fill value become NaN.
    fn select_pressure(&self, df: &DataFrame, file: &DatasetFile) -> Result<(String, Vec<f64>)> {
        let mut fallback: Option<(String, Vec<f64>, Option<f64>)> = None;

        for candidate in &self.pressure_candidates {
            let Some(values) = float_column(df, candidate)? else {
                continue;
            };
            let fill = self.parameters.get(candidate).and_then(|p| p.fill_value);
            let degenerate = values
                .iter()
                .all(|&v| v.is_nan() || v == 0.0 || fill.is_some_and(|f| v == f));

            if !degenerate {
                if fallback.is_some() {
                    info!(
                        "Pressure fallback in {}: using {}",
                        file.path.display(),
                        candidate
                    );
                }
                return Ok((candidate.clone(), mask_fill_depths(values, fill, candidate)));
            }

            debug!(
                "Pressure column {} in {} is all zero, NaN or fill",
                candidate,
                file.path.display()
            );
            if fallback.is_none() {
                fallback = Some((candidate.clone(), values, fill));
            }
        }

        match fallback {
            Some((column, values, fill)) => {
                warn!(
                    "No usable pressure column in {}, keeping degenerate {}",
                    file.path.display(),
                    column
                );
                let depths = mask_fill_depths(values, fill, &column);
                Ok((column, depths))
            }
            None => Err(RangeError::invalid_format(
                &file.path,
                format!(
                    "no pressure column among [{}]",
                    self.pressure_candidates.join(", ")
                ),
            )),
        }
    }

    /// Parse a dataset file once: timestamps and the pressure axis are
    /// resolved here and shared by every variable read from it
    pub fn load(&self, file: &DatasetFile) -> Result<LoadedDataset> {
        let frame = read_csv(&file.path)?;

        let timestamps = string_column(&frame, TIME_COLUMN)?
            .ok_or_else(|| RangeError::missing_column(&file.path, TIME_COLUMN))?
            .into_iter()
            .map(|time| {
                let time = time.ok_or_else(|| {
                    RangeError::invalid_format(&file.path, "empty cell in time column")
                })?;
                parse_timestamp(&time)
            })
            .collect::<Result<Vec<_>>>()?;
        let (column, depths) = self.select_pressure(&frame, file)?;

        Ok(LoadedDataset {
            file: file.clone(),
            frame,
            timestamps,
            depths,
            pressure: PressureAxis {
                units: self.pressure_units(&column),
                column,
            },
        })
    }
}

fn mask_fill_depths(values: Vec<f64>, fill: Option<f64>, column: &str) -> Vec<f64> {
    let Some(fill) = fill else {
        return values;
    };
    let mut masked = 0;
    let depths = values
        .into_iter()
        .map(|v| {
            if v == fill {
                masked += 1;
                f64::NAN
            } else {
                v
            }
        })
        .collect();
    if masked > 0 {
        info!("{} fill depths in {} treated as missing", masked, column);
    }
    depths
}

/// A parsed dataset file
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub file: DatasetFile,
    frame: DataFrame,
    timestamps: Vec<DateTime<Utc>>,
    depths: Vec<f64>,
    pub pressure: PressureAxis,
}

impl LoadedDataset {
    /// Observations of `variable`, `None` when the file does not carry it
    pub fn series(&self, variable: &ScienceVariable) -> Result<Option<VariableSeries>> {
        let Some(values) = float_column(&self.frame, &variable.name)? else {
            debug!(
                "Variable {} not present in {}",
                variable.name,
                self.file.path.display()
            );
            return Ok(None);
        };

        let observations: Vec<Observation> = self
            .timestamps
            .iter()
            .zip(&self.depths)
            .zip(values)
            .map(|((&timestamp, &depth), value)| {
                Observation::new(
                    timestamp,
                    depth,
                    value,
                    variable.fill_value,
                    self.file.deployment,
                )
            })
            .collect();

        debug!(
            "Read {} observations of {} from {}",
            observations.len(),
            variable.name,
            self.file.path.display()
        );

        Ok(Some(VariableSeries {
            observations: ObservationSet::new(
                &variable.name,
                &variable.units,
                variable.fill_value,
                observations,
            ),
            pressure: self.pressure.clone(),
        }))
    }
}

impl DatasetReader for CsvDatasetReader {
    fn read_variable(
        &self,
        file: &DatasetFile,
        variable: &ScienceVariable,
    ) -> Result<Option<VariableSeries>> {
        self.load(file)?.series(variable)
    }
}
