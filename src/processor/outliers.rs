//! Sigma-rule outlier window detection
//!
//! Within each populated bin the accepted band is `mean ± k·std`. Values
//! strictly outside it are outliers, and the span from the earliest to the
//! latest outlier of a bin becomes one exclusion window. Windows are returned
//! to the caller, never applied here.

use crate::constants::MIN_COUNT_FOR_STD;
use crate::models::{DepthBin, ExclusionWindow, WindowSource};
use crate::processor::binning::DepthBinning;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Accepted band of one bin, placed at the bin's mean depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinEnvelope {
    pub bin: DepthBin,
    pub depth_mean: f64,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub outliers: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OutlierScan {
    pub windows: Vec<ExclusionWindow>,
    pub envelopes: Vec<BinEnvelope>,
}

impl OutlierScan {
    pub fn total_outliers(&self) -> usize {
        self.envelopes.iter().map(|e| e.outliers).sum()
    }
}

/// Scan every bin with at least two members for values outside `mean ± k·std`
pub fn detect_outlier_windows(binning: &DepthBinning, sigma_multiplier: f64) -> OutlierScan {
    let mut scan = OutlierScan::default();

    for group in &binning.bins {
        let Some(stats) = group.statistics.as_ref() else {
            continue;
        };
        if stats.count < MIN_COUNT_FOR_STD {
            continue;
        }
        let Some(std) = stats.std.filter(|s| s.is_finite()) else {
            continue;
        };

        let lower = stats.mean - sigma_multiplier * std;
        let upper = stats.mean + sigma_multiplier * std;

        let mut outliers = 0;
        let mut span: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        for obs in group.members.iter().filter(|o| o.value < lower || o.value > upper) {
            outliers += 1;
            span = Some(match span {
                None => (obs.timestamp, obs.timestamp),
                Some((first, last)) => (first.min(obs.timestamp), last.max(obs.timestamp)),
            });
        }

        if let Some((first, last)) = span {
            debug!(
                "{} bin {}: {} values outside [{:.4}, {:.4}]",
                binning.variable, group.bin, outliers, lower, upper
            );
            scan.windows
                .push(ExclusionWindow::new(first, last, WindowSource::SigmaRule));
        }

        scan.envelopes.push(BinEnvelope {
            bin: group.bin,
            depth_mean: stats.depth_mean,
            mean: stats.mean,
            lower,
            upper,
            outliers,
        });
    }

    if !scan.windows.is_empty() {
        info!(
            "{}: {} sigma windows covering {} outliers",
            binning.variable,
            scan.windows.len(),
            scan.total_outliers()
        );
    }
    scan
}
