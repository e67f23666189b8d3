//! Per-variable reduction: filter, bin, scan, and the optional second pass

use crate::config::PipelineConfig;
use crate::models::{ExclusionWindow, ObservationSet};
use crate::processor::binning::{DepthBinning, bin_observations};
use crate::processor::filter::{
    FilterOutcome, FilterStage, FilterStatus, apply_quality_filters, apply_sigma_windows,
};
use crate::processor::outliers::{OutlierScan, detect_outlier_windows};
use tracing::info;

/// Trusted set and bins after the sigma windows were applied
#[derive(Debug, Clone)]
pub struct SecondPass {
    pub filter: FilterOutcome,
    /// `None` when the sigma windows removed every observation
    pub binning: Option<DepthBinning>,
}

/// Bins and outlier scan of a variable that survived filtering
#[derive(Debug, Clone)]
pub struct BinnedVariable {
    pub binning: DepthBinning,
    pub scan: OutlierScan,
    pub second_pass: Option<SecondPass>,
}

#[derive(Debug, Clone)]
pub struct VariableReduction {
    pub filter: FilterOutcome,
    /// `None` when the filter chain emptied the set
    pub binned: Option<BinnedVariable>,
}

impl VariableReduction {
    /// Bins the report is built from, `None` once a pass emptied the set
    pub fn report_binning(&self) -> Option<&DepthBinning> {
        let binned = self.binned.as_ref()?;
        match &binned.second_pass {
            Some(pass) => pass.binning.as_ref(),
            None => Some(&binned.binning),
        }
    }

    /// Deployments contributing to the reported set
    pub fn report_deployments(&self) -> Vec<u32> {
        match self.second_pass() {
            Some(pass) => pass.filter.trusted.deployments(),
            None => self.filter.trusted.deployments(),
        }
    }

    /// The stage that removed the last observation, if any did
    pub fn empty_after(&self) -> Option<FilterStage> {
        let status = match self.second_pass() {
            Some(pass) if self.filter.status == FilterStatus::Trusted => pass.filter.status,
            _ => self.filter.status,
        };
        match status {
            FilterStatus::EmptyAfter(stage) => Some(stage),
            FilterStatus::Trusted => None,
        }
    }

    pub fn sigma_windows(&self) -> &[ExclusionWindow] {
        self.binned
            .as_ref()
            .map(|b| b.scan.windows.as_slice())
            .unwrap_or(&[])
    }

    fn second_pass(&self) -> Option<&SecondPass> {
        self.binned.as_ref().and_then(|b| b.second_pass.as_ref())
    }
}

/// Reduce one variable's observations to depth-binned statistics
///
/// When `config.apply_sigma_windows` is set the sigma windows found on the
/// first pass are applied to the trusted set, which is then binned again.
pub fn reduce_variable(
    set: &ObservationSet,
    config: &PipelineConfig,
    global_range: Option<(f64, f64)>,
    windows: &[ExclusionWindow],
) -> VariableReduction {
    let filter = apply_quality_filters(set, config, global_range, windows);
    if filter.is_empty() {
        return VariableReduction {
            filter,
            binned: None,
        };
    }

    let binning = bin_observations(&filter.trusted, config);
    let scan = detect_outlier_windows(&binning, config.sigma_multiplier);

    let second_pass = config.apply_sigma_windows.then(|| {
        let second = apply_sigma_windows(&filter.trusted, &scan.windows);
        info!(
            "{} second pass: {} -> {} observations",
            set.variable,
            filter.trusted.len(),
            second.trusted.len()
        );
        let binning = (!second.is_empty()).then(|| bin_observations(&second.trusted, config));
        SecondPass {
            filter: second,
            binning,
        }
    });

    VariableReduction {
        filter,
        binned: Some(BinnedVariable {
            binning,
            scan,
            second_pass,
        }),
    }
}
