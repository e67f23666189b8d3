//! Main processing engine.
//!
//! Orchestrates a data-range run: dataset files are grouped by reference
//! designator, external metadata is loaded once per designator, and every
//! science variable goes through the filter chain, depth binning and
//! outlier scan before its rows join the designator's range report.

pub mod binning;
pub mod discovery;
pub mod filter;
pub mod outliers;
pub mod pipeline;
pub mod report;

#[cfg(test)]
pub mod tests;

use self::discovery::{group_by_designator, select_files};
use self::pipeline::reduce_variable;
use self::report::{RangeReport, should_report};

use crate::config::Config;
use crate::error::{RangeError, Result, is_critical_error};
use crate::models::{DatasetFile, ObservationSet, ProcessingStats, ReferenceDesignator};
use crate::sources::{
    CsvDatasetReader, DataReviewCatalog, DeploymentLookup, ExclusionSources, GlobalRangeLookup,
    GlobalRangeTable, LocalExclusionFiles, NoGlobalRanges, PortalExport, ReviewBoardExport,
};

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome of one designator
#[derive(Debug, Default)]
pub struct DesignatorSummary {
    pub variables_reported: usize,
    pub variables_skipped: usize,
    pub rows_written: usize,
    pub sigma_windows: usize,
    pub output_paths: Vec<PathBuf>,
}

/// Run-wide exclusion exports, loaded once
#[derive(Debug, Default)]
struct SharedExports {
    review: ReviewBoardExport,
    portal: PortalExport,
}

/// Main processor for data-range runs
#[derive(Debug)]
pub struct RangeProcessor {
    config: Config,
    show_progress: bool,
}

impl RangeProcessor {
    /// Create a processor; the configuration is validated here
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            show_progress: false,
        })
    }

    /// Show a progress bar over designators
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every designator represented in `files`
    ///
    /// A designator whose processing fails is logged and counted, and the
    /// run continues; only configuration errors abort the run.
    pub fn process(&self, files: Vec<DatasetFile>) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();

        let files = select_files(files, &self.config.pipeline);
        let groups = group_by_designator(files);
        info!("Processing {} reference designators", groups.len());

        if groups.is_empty() {
            stats.processing_time_ms = start_time.elapsed().as_millis();
            return Ok(stats);
        }

        self.config.ensure_output_directory()?;
        let exports = self.load_shared_exports()?;
        let progress = self.create_progress_bar(groups.len());

        for (refdes, designator_files) in &groups {
            if let Some(pb) = &progress {
                pb.set_message(refdes.to_string());
            }

            match self.process_designator(refdes, designator_files, &exports) {
                Ok(summary) => {
                    stats.designators_processed += 1;
                    stats.variables_reported += summary.variables_reported;
                    stats.variables_skipped += summary.variables_skipped;
                    stats.rows_written += summary.rows_written;
                    stats.sigma_windows += summary.sigma_windows;
                    stats.output_paths.extend(summary.output_paths);
                }
                Err(e) if is_critical_error(&e) => {
                    if let Some(pb) = &progress {
                        pb.abandon_with_message(format!("Aborted at {refdes}"));
                    }
                    return Err(e);
                }
                Err(e) => {
                    let failure = RangeError::designator_failed(refdes.to_string(), e.to_string());
                    error!("{}", failure);
                    stats.designators_failed += 1;
                }
            }

            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = &progress {
            pb.finish_with_message("Complete");
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        info!(
            "Run complete: {} designators processed, {} failed, {} rows written",
            stats.designators_processed, stats.designators_failed, stats.rows_written
        );
        Ok(stats)
    }

    fn load_shared_exports(&self) -> Result<SharedExports> {
        let paths = &self.config.paths;
        let review = match &paths.review_export {
            Some(path) => ReviewBoardExport::load(path)?,
            None => {
                debug!("No review-board export configured");
                ReviewBoardExport::default()
            }
        };
        let portal = match &paths.portal_export {
            Some(path) => PortalExport::load(path)?,
            None => {
                debug!("No portal export configured");
                PortalExport::default()
            }
        };
        Ok(SharedExports { review, portal })
    }

    fn create_progress_bar(&self, total: usize) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} designators | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        Some(pb)
    }

    /// Build and write the range report of one designator
    fn process_designator(
        &self,
        refdes: &ReferenceDesignator,
        files: &[DatasetFile],
        exports: &SharedExports,
    ) -> Result<DesignatorSummary> {
        let pipeline = &self.config.pipeline;
        let paths = &self.config.paths;
        info!("Processing {} ({} files)", refdes, files.len());

        let catalog = DataReviewCatalog::load(&paths.metadata_dir, refdes)?;
        log_deployments(&catalog, refdes, files);

        let global_ranges: Box<dyn GlobalRangeLookup> = match &paths.global_ranges {
            Some(path) => Box::new(GlobalRangeTable::load(path)?),
            None => {
                info!("No global range table configured, global range stage disabled");
                Box::new(NoGlobalRanges)
            }
        };
        let local = match &paths.exclusion_dir {
            Some(root) => LocalExclusionFiles::load(root, refdes)?,
            None => LocalExclusionFiles::default(),
        };
        let exclusions = ExclusionSources::new()
            .with_source(&local)
            .with_source(&exports.review)
            .with_source(&exports.portal);

        let mut method_streams: Vec<String> = Vec::new();
        for file in files {
            let key = file.method_stream();
            if !method_streams.contains(&key) {
                method_streams.push(key);
            }
        }
        let variables = catalog.science_variables(method_streams.iter().map(String::as_str));
        if variables.is_empty() {
            warn!(
                "No science variables listed for {} streams [{}]",
                refdes,
                method_streams.join(", ")
            );
        }

        let reader = CsvDatasetReader::new(pipeline.pressure_candidates.clone())
            .with_parameter_metadata(catalog.all_parameters());
        let datasets = files
            .iter()
            .map(|file| reader.load(file))
            .collect::<Result<Vec<_>>>()?;

        let mut report = RangeReport::new(refdes.clone());
        let mut summary = DesignatorSummary::default();

        for variable in &variables {
            if !should_report(variable, pipeline.report_pressure_variables) {
                debug!("Skipping pressure variable {}", variable.name);
                continue;
            }

            let mut observations = Vec::new();
            let mut found = false;
            for dataset in &datasets {
                if let Some(series) = dataset.series(variable)? {
                    found = true;
                    observations.extend(
                        series
                            .observations
                            .iter()
                            .filter(|o| pipeline.in_time_range(o.timestamp))
                            .copied(),
                    );
                }
            }

            if !found {
                info!("{} not present in any file of {}, skipping", variable.name, refdes);
                summary.variables_skipped += 1;
                continue;
            }

            let set = ObservationSet::new(
                &variable.name,
                &variable.units,
                variable.fill_value,
                observations,
            );
            if set.is_empty() {
                info!("{} has no observations in the selected time range", variable.name);
            } else if set.all_nan() {
                info!("{} is all NaN", variable.name);
            } else if set.all_fill() {
                info!("{} is all fill values", variable.name);
            }

            let global_range = global_ranges.global_range(refdes, &variable.name);
            let windows = exclusions.collect(refdes, &variable.name);
            let reduction = reduce_variable(&set, pipeline, global_range, &windows);

            let Some(binning) = reduction.report_binning() else {
                if let Some(stage) = reduction.empty_after() {
                    info!("{} empty after {} filter, skipping", variable.name, stage);
                }
                summary.variables_skipped += 1;
                continue;
            };

            let deployments = reduction.report_deployments();
            let added = report.add_variable(&variable.name, &deployments, binning);
            report.add_sigma_windows(&variable.name, reduction.sigma_windows());
            summary.sigma_windows += reduction.sigma_windows().len();
            if added > 0 {
                summary.variables_reported += 1;
            } else {
                summary.variables_skipped += 1;
            }
        }

        if report.is_empty() {
            warn!("No variable of {} produced report rows, nothing written", refdes);
            return Ok(summary);
        }

        summary.rows_written = report.len();
        summary.output_paths = report.write(&paths.output_dir)?;
        Ok(summary)
    }
}

fn log_deployments(
    catalog: &DataReviewCatalog,
    refdes: &ReferenceDesignator,
    files: &[DatasetFile],
) {
    let mut deployments: Vec<u32> = files.iter().map(|f| f.deployment).collect();
    deployments.sort_unstable();
    deployments.dedup();

    for number in deployments {
        match catalog.deployment(refdes, number) {
            Some(info) => info!(
                "{} deployment {}: {} to {}, depth {}",
                refdes,
                number,
                info.start_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                info.stop_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "ongoing".to_string()),
                info.deployment_depth
                    .map(|d| format!("{d} m"))
                    .unwrap_or_else(|| "unknown".to_string())
            ),
            None => warn!("{} deployment {} not listed in catalog", refdes, number),
        }
    }
}
