//! Tests for the file-backed sources
//!
//! Fixtures write small CSV and JSON files into a temporary directory.

pub mod exclusions_tests;
pub mod global_ranges_tests;

use crate::models::{DatasetFile, ReferenceDesignator};
use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub const TEST_REFDES: &str = "CE09OSPM-WFP01-04-FLORTK000";

pub fn test_refdes() -> ReferenceDesignator {
    ReferenceDesignator::parse(TEST_REFDES).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

/// Write `contents` to `dir/relative`, creating parent directories
pub fn write_file(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Write a dataset export for deployment 1 of the test designator
pub fn write_dataset(dir: &Path, contents: &str) -> DatasetFile {
    let path = write_file(
        dir,
        &format!("deployment0001_{TEST_REFDES}-recovered_wfp-flort_sample.csv"),
        contents,
    );
    DatasetFile::from_path(&path).unwrap()
}

/// A data-review catalog with one science variable per stream
pub fn sample_catalog_json() -> &'static str {
    r#"{
        "instrument": {
            "deployments": [
                {
                    "deployment_number": 1,
                    "start_date": "2015-04-01T00:00:00",
                    "stop_date": "2015-09-30T12:00:00",
                    "deployment_depth": 540.0,
                    "latitude": 46.85,
                    "longitude": -124.98
                },
                {
                    "deployment_number": 2,
                    "start_date": "2015-10-01T00:00:00",
                    "stop_date": null
                }
            ],
            "data_streams": [
                {
                    "method": "recovered_wfp",
                    "stream_name": "flort_sample",
                    "stream": {
                        "parameters": [
                            {"name": "time", "unit": "s", "data_product_type": "Unknown"},
                            {"name": "int_ctd_pressure", "unit": "dbar", "data_product_type": "Science Data", "fill_value": "-9999999"},
                            {"name": "fluorometric_chlorophyll_a", "unit": "ug L-1", "data_product_type": "Science Data", "fill_value": -9999999.0},
                            {"name": "optical_backscatter", "unit": "m-1", "data_product_type": "Science Data", "fill_value": -9999999.0}
                        ]
                    }
                },
                {
                    "method": "telemetered",
                    "stream_name": "flort_sample",
                    "stream": {
                        "parameters": [
                            {"name": "fluorometric_chlorophyll_a", "unit": "ug L-1", "data_product_type": "Science Data", "fill_value": -9999999.0},
                            {"name": "raw_signal_chl", "unit": "counts", "data_product_type": "Unprocessed Data"}
                        ]
                    }
                }
            ]
        }
    }"#
}
