//! Range report builder and CSV writers
//!
//! Rows of every science variable of one designator accumulate in a
//! [`RangeReport`] that is written once, to
//! `<output_dir>/<array>/<subsite>/<refdes>_data_ranges.csv`. The sigma
//! windows found for the designator go next to it in
//! `<refdes>_sigma_windows.csv`.

use crate::constants::report_columns as cols;
use crate::constants::{DATA_RANGES_SUFFIX, REPORT_FLOAT_PRECISION, SIGMA_WINDOWS_SUFFIX};
use crate::error::Result;
use crate::models::{ExclusionWindow, RangeReportRow, ReferenceDesignator, ScienceVariable};
use crate::processor::binning::DepthBinning;
use chrono::SecondsFormat;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Whether a variable belongs in the report
///
/// Pressure is the depth axis itself, so pressure variables are left out
/// unless explicitly requested.
pub fn should_report(variable: &ScienceVariable, include_pressure: bool) -> bool {
    include_pressure || !variable.is_pressure()
}

#[derive(Debug, Clone)]
pub struct RangeReport {
    refdes: ReferenceDesignator,
    rows: Vec<RangeReportRow>,
    sigma_windows: Vec<(String, ExclusionWindow)>,
}

impl RangeReport {
    pub fn new(refdes: ReferenceDesignator) -> Self {
        Self {
            refdes,
            rows: Vec::new(),
            sigma_windows: Vec::new(),
        }
    }

    pub fn refdes(&self) -> &ReferenceDesignator {
        &self.refdes
    }

    /// Append one row per populated bin; returns the number of rows added
    pub fn add_variable(
        &mut self,
        variable: &str,
        deployments: &[u32],
        binning: &DepthBinning,
    ) -> usize {
        let before = self.rows.len();
        self.rows.extend(
            binning
                .statistics()
                .map(|stats| RangeReportRow::from_statistics(variable, deployments, stats)),
        );
        let added = self.rows.len() - before;
        if added == 0 {
            info!("{}: no populated bins, nothing to report", variable);
        } else {
            debug!("{}: {} report rows", variable, added);
        }
        added
    }

    pub fn add_sigma_windows(&mut self, variable: &str, windows: &[ExclusionWindow]) {
        self.sigma_windows
            .extend(windows.iter().map(|w| (variable.to_string(), *w)));
    }

    pub fn rows(&self) -> &[RangeReportRow] {
        &self.rows
    }

    pub fn sigma_windows(&self) -> &[(String, ExclusionWindow)] {
        &self.sigma_windows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `<output_root>/<array>/<subsite>`
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        output_root
            .join(self.refdes.array())
            .join(&self.refdes.subsite)
    }

    pub fn report_path(&self, output_root: &Path) -> PathBuf {
        self.output_dir(output_root)
            .join(format!("{}{}", self.refdes, DATA_RANGES_SUFFIX))
    }

    pub fn sigma_windows_path(&self, output_root: &Path) -> PathBuf {
        self.output_dir(output_root)
            .join(format!("{}{}", self.refdes, SIGMA_WINDOWS_SUFFIX))
    }

    /// Report rows as a frame with the published column order
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let floats = |f: fn(&RangeReportRow) -> f64| -> Vec<f64> { rows.iter().map(f).collect() };

        let columns = vec![
            Column::new(
                cols::PARAMETER.into(),
                rows.iter().map(|r| r.parameter.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                cols::DEPLOYMENTS.into(),
                rows.iter().map(|r| r.deployments.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                cols::DEPTH_BIN.into(),
                rows.iter().map(|r| r.bin.to_string()).collect::<Vec<_>>(),
            ),
            Column::new(
                cols::COUNT.into(),
                rows.iter().map(|r| r.count as u64).collect::<Vec<_>>(),
            ),
            Column::new(cols::MEAN.into(), floats(|r| r.mean)),
            Column::new(
                cols::STD.into(),
                rows.iter().map(|r| r.std).collect::<Vec<Option<f64>>>(),
            ),
            Column::new(cols::MIN.into(), floats(|r| r.min)),
            Column::new(cols::Q25.into(), floats(|r| r.q25)),
            Column::new(cols::Q50.into(), floats(|r| r.q50)),
            Column::new(cols::Q75.into(), floats(|r| r.q75)),
            Column::new(cols::MAX.into(), floats(|r| r.max)),
        ];
        Ok(DataFrame::new(columns)?)
    }

    pub fn sigma_windows_dataframe(&self) -> Result<DataFrame> {
        let windows = &self.sigma_windows;
        let timestamps = |pick: fn(&ExclusionWindow) -> chrono::DateTime<chrono::Utc>| {
            windows
                .iter()
                .map(|(_, w)| pick(w).to_rfc3339_opts(SecondsFormat::Secs, true))
                .collect::<Vec<_>>()
        };

        let columns = vec![
            Column::new(
                "parameter".into(),
                windows.iter().map(|(v, _)| v.clone()).collect::<Vec<_>>(),
            ),
            Column::new("start".into(), timestamps(|w| w.start)),
            Column::new("end".into(), timestamps(|w| w.end)),
            Column::new(
                "source".into(),
                windows
                    .iter()
                    .map(|(_, w)| w.source.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
        ];
        Ok(DataFrame::new(columns)?)
    }

    /// Write the report, and the sigma windows when there are any
    pub fn write(&self, output_root: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(self.output_dir(output_root))?;
        let mut written = Vec::new();

        let report_path = self.report_path(output_root);
        write_csv(&mut self.to_dataframe()?, &report_path)?;
        info!(
            "Wrote {} rows for {} to {}",
            self.rows.len(),
            self.refdes,
            report_path.display()
        );
        written.push(report_path);

        if !self.sigma_windows.is_empty() {
            let windows_path = self.sigma_windows_path(output_root);
            write_csv(&mut self.sigma_windows_dataframe()?, &windows_path)?;
            info!(
                "Wrote {} sigma windows to {}",
                self.sigma_windows.len(),
                windows_path.display()
            );
            written.push(windows_path);
        }

        Ok(written)
    }
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_float_precision(Some(REPORT_FLOAT_PRECISION))
        .finish(df)?;
    Ok(())
}
