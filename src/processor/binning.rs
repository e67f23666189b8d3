//! Depth binning engine
//!
//! Trusted observations are grouped into fixed-width `[lower, upper)` depth
//! bins. The first bin starts one width below the shallowest depth, aligned
//! to the bin grid, and bins continue until the last upper edge reaches
//! `ceil(max depth) + width`. Empty bins are kept so the sequence is
//! contiguous, but only populated bins carry statistics.

use crate::config::PipelineConfig;
use crate::constants::{MAX_DEPTH_BINS, MIN_COUNT_FOR_STD};
use crate::models::{BinStatistics, DepthBin, Observation, ObservationSet};
use tracing::{debug, warn};

/// One depth bin and the observations assigned to it
#[derive(Debug, Clone)]
pub struct BinGroup {
    pub bin: DepthBin,
    pub members: ObservationSet,
    /// `None` for empty bins
    pub statistics: Option<BinStatistics>,
}

/// Bins of one variable in ascending depth order
#[derive(Debug, Clone)]
pub struct DepthBinning {
    pub variable: String,
    pub bins: Vec<BinGroup>,
    /// Observations that could not be placed in a bin
    pub unplaced: usize,
}

impl DepthBinning {
    pub fn populated(&self) -> impl Iterator<Item = &BinGroup> {
        self.bins.iter().filter(|g| !g.members.is_empty())
    }

    pub fn statistics(&self) -> impl Iterator<Item = &BinStatistics> {
        self.bins.iter().filter_map(|g| g.statistics.as_ref())
    }

    /// Total observations placed in a bin
    pub fn placed(&self) -> usize {
        self.bins.iter().map(|g| g.members.len()).sum()
    }
}

/// Contiguous bins of `width` covering `[min_depth, max_depth]`
///
/// Returns no bins when either bound is not finite, or when the span would
/// need more than [`MAX_DEPTH_BINS`] bins.
pub fn depth_bins(min_depth: f64, max_depth: f64, width: f64) -> Vec<DepthBin> {
    if !(min_depth.is_finite() && max_depth.is_finite() && width > 0.0) {
        return Vec::new();
    }

    let origin = (min_depth.floor() / width).floor() * width - width;
    let target = max_depth.ceil() + width;

    let needed = ((target - origin) / width).ceil();
    if !(needed <= MAX_DEPTH_BINS as f64) {
        warn!(
            "Depths {} to {} need {} bins of {} dbar, more than {}; not binning",
            min_depth, max_depth, needed, width, MAX_DEPTH_BINS
        );
        return Vec::new();
    }

    let mut bins = Vec::with_capacity(needed as usize);
    let mut index = 0usize;
    loop {
        let lower = origin + index as f64 * width;
        let upper = origin + (index + 1) as f64 * width;
        bins.push(DepthBin::new(lower, upper));
        if upper >= target || bins.len() > MAX_DEPTH_BINS {
            break;
        }
        index += 1;
    }
    bins
}

/// Group `set` into depth bins of `config.zcell_size`
///
/// Observations without a finite depth are counted as unplaced, as is the
/// whole set when its depth span is too wide to bin.
pub fn bin_observations(set: &ObservationSet, config: &PipelineConfig) -> DepthBinning {
    let width = config.zcell_size;
    let placeable: Vec<&Observation> = set.iter().filter(|o| o.depth.is_finite()).collect();
    if placeable.len() < set.len() {
        warn!(
            "{}: {} observations have no finite depth and were not binned",
            set.variable,
            set.len() - placeable.len()
        );
    }

    let min_depth = placeable.iter().map(|o| o.depth).fold(f64::INFINITY, f64::min);
    let max_depth = placeable
        .iter()
        .map(|o| o.depth)
        .fold(f64::NEG_INFINITY, f64::max);
    let bins = depth_bins(min_depth, max_depth, width);

    let mut members: Vec<Vec<Observation>> = vec![Vec::new(); bins.len()];
    let unplaced = match bins.first() {
        Some(first) => {
            let origin = first.lower;
            for obs in &placeable {
                let index =
                    locate(&bins, ((obs.depth - origin) / width).floor() as usize, obs.depth);
                members[index].push(**obs);
            }
            set.len() - placeable.len()
        }
        None => set.len(),
    };

    let groups: Vec<BinGroup> = bins
        .into_iter()
        .zip(members)
        .map(|(bin, members)| {
            let statistics = compute_statistics(bin, &members, config.percentile);
            BinGroup {
                bin,
                members: set.with_observations(members),
                statistics,
            }
        })
        .collect();

    debug!(
        "{}: {} observations in {} bins ({} populated)",
        set.variable,
        set.len() - unplaced,
        groups.len(),
        groups.iter().filter(|g| g.statistics.is_some()).count()
    );

    DepthBinning {
        variable: set.variable.clone(),
        bins: groups,
        unplaced,
    }
}

/// Correct an arithmetic bin index against the actual edges
fn locate(bins: &[DepthBin], guess: usize, depth: f64) -> usize {
    let mut index = guess.min(bins.len() - 1);
    while index > 0 && depth < bins[index].lower {
        index -= 1;
    }
    while index + 1 < bins.len() && depth >= bins[index].upper {
        index += 1;
    }
    index
}

/// Descriptive statistics of the member values; `None` for an empty bin
pub fn compute_statistics(
    bin: DepthBin,
    members: &[Observation],
    percentile: f64,
) -> Option<BinStatistics> {
    if members.is_empty() {
        return None;
    }

    let count = members.len();
    let n = count as f64;
    let mut values: Vec<f64> = members.iter().map(|o| o.value).collect();
    values.sort_by(f64::total_cmp);

    let mean = values.iter().sum::<f64>() / n;
    let std = (count >= MIN_COUNT_FOR_STD).then(|| {
        let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (sum_sq / (n - 1.0)).sqrt()
    });
    let depth_mean = members.iter().map(|o| o.depth).sum::<f64>() / n;
    let fraction = percentile / 100.0;

    Some(BinStatistics {
        bin,
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        q50: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
        depth_mean,
        percentile_envelope: (quantile(&values, fraction), quantile(&values, 1.0 - fraction)),
    })
}

/// Quantile of sorted values, linear interpolation between closest ranks
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let position = q.clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let frac = position - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}
