//! Tests for the processor module
//!
//! Covers the filter chain, depth binning, outlier detection, report building
//! and complete designator runs against temporary directories.

pub mod report_tests;

// Test helper functions and fixtures
use crate::config::PipelineConfig;
use crate::models::{Observation, ObservationSet};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub const FILL: f64 = -9999.0;

/// Timestamp `minutes` after the start of the test deployment
pub fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// Observation of deployment 1 at `t(minutes)`
pub fn obs(minutes: i64, depth: f64, value: f64) -> Observation {
    Observation::new(t(minutes), depth, value, Some(FILL), 1)
}

/// Observation of a given deployment
pub fn obs_in(deployment: u32, minutes: i64, depth: f64, value: f64) -> Observation {
    Observation::new(t(minutes), depth, value, Some(FILL), deployment)
}

pub fn set_of(observations: Vec<Observation>) -> ObservationSet {
    ObservationSet::new("optical_backscatter", "m-1", Some(FILL), observations)
}

/// `count` observations at one depth, one minute apart
pub fn constant_bin(start_minute: i64, count: i64, depth: f64, value: f64) -> Vec<Observation> {
    (0..count)
        .map(|i| obs(start_minute + i, depth, value))
        .collect()
}

/// Deterministic pseudo-random observations spread over 0-200 dbar
pub fn scattered_observations(count: usize) -> Vec<Observation> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 10_000) as f64 / 10_000.0
    };
    (0..count)
        .map(|i| obs(i as i64, next() * 200.0, next() * 30.0 - 5.0))
        .collect()
}

pub fn test_config() -> PipelineConfig {
    PipelineConfig::default()
}
