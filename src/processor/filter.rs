//! Quality filter chain
//!
//! Six rejection stages run in a fixed order, each consuming the output of
//! the previous one:
//!
//! 1. fill value
//! 2. NaN
//! 3. extreme value (`|value|` above the configured threshold)
//! 4. global range, when one is configured for the variable
//! 5. suspect time (exclusion windows)
//! 6. depth range, when `zdbar` is configured
//!
//! A stage that leaves nothing behind ends the chain. The outcome names that
//! stage and downstream processing is skipped for the variable.
//!
//! The optional second pass removes the sigma-rule windows from the trusted
//! set as a stage of its own, with the same outcome bookkeeping.

use crate::config::PipelineConfig;
use crate::models::{ExclusionWindow, ObservationSet};
use std::fmt;
use tracing::{debug, info};

/// One rejection stage of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterStage {
    FillValue,
    Nan,
    ExtremeValue,
    GlobalRange,
    SuspectTime,
    DepthRange,
    /// Second pass only, never part of [`FilterStage::ORDER`]
    SigmaWindow,
}

impl FilterStage {
    /// Stages in execution order
    pub const ORDER: [FilterStage; 6] = [
        FilterStage::FillValue,
        FilterStage::Nan,
        FilterStage::ExtremeValue,
        FilterStage::GlobalRange,
        FilterStage::SuspectTime,
        FilterStage::DepthRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterStage::FillValue => "fill value",
            FilterStage::Nan => "NaN",
            FilterStage::ExtremeValue => "extreme value",
            FilterStage::GlobalRange => "global range",
            FilterStage::SuspectTime => "suspect time",
            FilterStage::DepthRange => "depth range",
            FilterStage::SigmaWindow => "sigma window",
        }
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts recorded for one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub stage: FilterStage,
    pub before: usize,
    pub removed: usize,
    /// False when the stage had nothing configured and passed everything through
    pub applied: bool,
}

impl StageReport {
    pub fn after(&self) -> usize {
        self.before - self.removed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    Trusted,
    /// The named stage removed the last observation
    EmptyAfter(FilterStage),
}

/// Result of running the chain over one variable
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub trusted: ObservationSet,
    pub reports: Vec<StageReport>,
    pub status: FilterStatus,
}

impl FilterOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self.status, FilterStatus::EmptyAfter(_))
    }

    /// Observations removed by `stage`, `None` if the stage did not run
    pub fn removed_by(&self, stage: FilterStage) -> Option<usize> {
        self.reports
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.removed)
    }

    pub fn total_removed(&self) -> usize {
        self.reports.iter().map(|r| r.removed).sum()
    }
}

/// Drop every observation whose timestamp lies in any window
///
/// Windows are closed intervals and may overlap. An empty window list
/// returns the set unchanged.
pub fn apply_windows(set: &ObservationSet, windows: &[ExclusionWindow]) -> ObservationSet {
    if windows.is_empty() {
        return set.clone();
    }
    set.filtered(|o| !windows.iter().any(|w| w.contains(o.timestamp)))
}

/// Run the six stages over `set`
///
/// `global_range` is the inclusive `[min, max]` configured for the variable
/// and `windows` the union of its exclusion windows.
pub fn apply_quality_filters(
    set: &ObservationSet,
    config: &PipelineConfig,
    global_range: Option<(f64, f64)>,
    windows: &[ExclusionWindow],
) -> FilterOutcome {
    let mut current = set.clone();
    let mut reports = Vec::with_capacity(FilterStage::ORDER.len());

    for stage in FilterStage::ORDER {
        let before = current.len();
        let (next, applied) = run_stage(stage, &current, config, global_range, windows);
        let removed = before - next.len();

        if applied {
            info!(
                "{} {} filter: removed {} of {} observations",
                set.variable, stage, removed, before
            );
        } else {
            debug!("{} {} filter: not configured", set.variable, stage);
        }

        reports.push(StageReport {
            stage,
            before,
            removed,
            applied,
        });
        current = next;

        if current.is_empty() {
            info!(
                "{} empty after {} filter, skipping remaining stages",
                set.variable, stage
            );
            return FilterOutcome {
                trusted: current,
                reports,
                status: FilterStatus::EmptyAfter(stage),
            };
        }
    }

    FilterOutcome {
        trusted: current,
        reports,
        status: FilterStatus::Trusted,
    }
}

/// Remove the sigma-rule windows from a trusted set
pub fn apply_sigma_windows(set: &ObservationSet, windows: &[ExclusionWindow]) -> FilterOutcome {
    let stage = FilterStage::SigmaWindow;
    let before = set.len();
    let trusted = apply_windows(set, windows);
    let removed = before - trusted.len();
    info!(
        "{} {} filter: removed {} of {} observations",
        set.variable, stage, removed, before
    );

    let status = if trusted.is_empty() {
        info!("{} empty after {} filter", set.variable, stage);
        FilterStatus::EmptyAfter(stage)
    } else {
        FilterStatus::Trusted
    };

    FilterOutcome {
        trusted,
        reports: vec![StageReport {
            stage,
            before,
            removed,
            applied: !windows.is_empty(),
        }],
        status,
    }
}

fn run_stage(
    stage: FilterStage,
    set: &ObservationSet,
    config: &PipelineConfig,
    global_range: Option<(f64, f64)>,
    windows: &[ExclusionWindow],
) -> (ObservationSet, bool) {
    match stage {
        FilterStage::FillValue => {
            let fill = set.fill_value;
            (
                set.filtered(|o| !o.is_fill && fill.is_none_or(|f| o.value != f)),
                true,
            )
        }
        FilterStage::Nan => (set.filtered(|o| !o.value.is_nan()), true),
        FilterStage::ExtremeValue => {
            let threshold = config.extreme_value_threshold;
            (set.filtered(|o| o.value.abs() <= threshold), true)
        }
        FilterStage::GlobalRange => match global_range {
            Some((min, max)) => (set.filtered(|o| min <= o.value && o.value <= max), true),
            None => (set.clone(), false),
        },
        FilterStage::SuspectTime | FilterStage::SigmaWindow => {
            (apply_windows(set, windows), !windows.is_empty())
        }
        FilterStage::DepthRange => match config.zdbar {
            // NaN depths are left for the binning engine to count as unplaced
            Some(zdbar) => (set.filtered(|o| o.depth < zdbar || o.depth.is_nan()), true),
            None => (set.clone(), false),
        },
    }
}
