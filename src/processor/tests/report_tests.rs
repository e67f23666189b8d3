//! Tests for the range report builder and writers

use super::*;
use crate::models::{ExclusionWindow, ReferenceDesignator, ScienceVariable, WindowSource};
use crate::processor::binning::bin_observations;
use crate::processor::report::{RangeReport, should_report};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REFDES: &str = "CE09OSPM-WFP01-04-FLORTK000";

fn report() -> RangeReport {
    RangeReport::new(ReferenceDesignator::parse(REFDES).unwrap())
}

fn scenario_report() -> RangeReport {
    let set = set_of(vec![obs_in(2, 2, 12.0, 3.0), obs_in(1, 3, 22.0, 4.0)]);
    let binning = bin_observations(&set, &test_config());
    let mut report = report();
    report.add_variable("optical_backscatter", &set.deployments(), &binning);
    report
}

#[test]
fn test_one_row_per_populated_bin() {
    let report = scenario_report();
    assert_eq!(report.len(), 2);

    let rows = report.rows();
    assert_eq!(rows[0].parameter, "optical_backscatter");
    assert_eq!(rows[0].deployments, "1, 2");
    assert_eq!(rows[0].bin.to_string(), "[10, 20)");
    assert_eq!(rows[0].count, 1);
    assert_eq!(rows[0].mean, 3.0);
    assert!(rows[0].std.is_none());
    assert_eq!(rows[1].bin.to_string(), "[20, 30)");
    assert_eq!(rows[1].mean, 4.0);
}

#[test]
fn test_rows_accumulate_across_variables() {
    let mut report = scenario_report();
    let other = ObservationSet::new(
        "fluorometric_chlorophyll_a",
        "ug L-1",
        None,
        vec![obs(1, 12.0, 1.0), obs(2, 14.0, 2.0)],
    );
    let binning = bin_observations(&other, &test_config());
    let added = report.add_variable("fluorometric_chlorophyll_a", &[1], &binning);

    assert_eq!(added, 1);
    assert_eq!(report.len(), 3);
    assert_eq!(report.rows()[2].count, 2);
    assert!(report.rows()[2].std.is_some());
}

#[test]
fn test_pressure_variables_not_reported() {
    let pressure = ScienceVariable {
        name: "int_ctd_pressure".to_string(),
        units: "dbar".to_string(),
        fill_value: None,
    };
    let chlorophyll = ScienceVariable {
        name: "fluorometric_chlorophyll_a".to_string(),
        units: "ug L-1".to_string(),
        fill_value: None,
    };

    assert!(!should_report(&pressure, false));
    assert!(should_report(&pressure, true));
    assert!(should_report(&chlorophyll, false));
}

#[test]
fn test_output_paths() {
    let report = report();
    let root = Path::new("/out");
    assert_eq!(report.output_dir(root), PathBuf::from("/out/CE/CE09OSPM"));
    assert_eq!(
        report.report_path(root),
        PathBuf::from(format!("/out/CE/CE09OSPM/{REFDES}_data_ranges.csv"))
    );
    assert_eq!(
        report.sigma_windows_path(root),
        PathBuf::from(format!("/out/CE/CE09OSPM/{REFDES}_sigma_windows.csv"))
    );
}

#[test]
fn test_dataframe_column_order() {
    let df = scenario_report().to_dataframe().unwrap();
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "parameter",
            "deployments",
            "depth_bin",
            "count",
            "mean",
            "std",
            "min",
            "25%",
            "50%",
            "75%",
            "max"
        ]
    );
    assert_eq!(df.height(), 2);
}

#[test]
fn test_write_report_csv() {
    let temp_dir = TempDir::new().unwrap();
    let report = scenario_report();

    let written = report.write(temp_dir.path()).unwrap();
    assert_eq!(written, vec![report.report_path(temp_dir.path())]);

    let contents = fs::read_to_string(&written[0]).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines[0],
        "parameter,deployments,depth_bin,count,mean,std,min,25%,50%,75%,max"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("optical_backscatter,\"1, 2\",\"[10, 20)\",1,3.000000,,3.000000"));
    assert!(lines[2].contains("\"[20, 30)\",1,4.000000,,4.000000"));
}

#[test]
fn test_sigma_windows_written_when_present() {
    let temp_dir = TempDir::new().unwrap();
    let mut report = scenario_report();
    report.add_sigma_windows(
        "optical_backscatter",
        &[ExclusionWindow::new(t(3), t(15), WindowSource::SigmaRule)],
    );

    let written = report.write(temp_dir.path()).unwrap();
    assert_eq!(written.len(), 2);

    let contents = fs::read_to_string(report.sigma_windows_path(temp_dir.path())).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "parameter,start,end,source");
    assert_eq!(
        lines[1],
        "optical_backscatter,2015-05-01T00:03:00Z,2015-05-01T00:15:00Z,sigma_rule"
    );
}
