//! End-to-end tests of the data-range pipeline through the public API
//!
//! Dataset exports, the data-review catalog and the exclusion tables are
//! written to a temporary directory and a full run is checked against the
//! reports it produces.

use chrono::{Duration, TimeZone, Utc};
use data_range_processor::processor::discovery::discover_dataset_files;
use data_range_processor::{
    Config, DepthBin, ExclusionWindow, FilterStage, Observation, ObservationSet, PipelineConfig,
    RangeProcessor, WindowSource, apply_quality_filters, apply_windows, bin_observations,
    detect_outlier_windows, reduce_variable,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const REFDES: &str = "CE09OSPM-WFP01-03-CTDPFK000";

const CATALOG: &str = r#"{
    "instrument": {
        "deployments": [
            {"deployment_number": 4, "start_date": "2016-05-01T00:00:00", "stop_date": "2016-09-30T00:00:00", "deployment_depth": 540.0}
        ],
        "data_streams": [
            {
                "method": "recovered_wfp",
                "stream_name": "ctdpf_ckl_wfp_instrument_recovered",
                "stream": {
                    "parameters": [
                        {"name": "ctdpf_ckl_seawater_pressure", "unit": "dbar", "data_product_type": "Science Data", "fill_value": -9999999.0},
                        {"name": "ctdpf_ckl_seawater_temperature", "unit": "ºC", "data_product_type": "Science Data", "fill_value": -9999999.0},
                        {"name": "practical_salinity", "unit": "1", "data_product_type": "Science Data", "fill_value": -9999999.0}
                    ]
                }
            }
        ]
    }
}"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Two casts through 0-60 dbar; one temperature spike at 35 dbar
fn dataset_csv() -> String {
    let start = Utc.with_ymd_and_hms(2016, 6, 1, 0, 0, 0).unwrap();
    let mut csv = String::from(
        "time,ctdpf_ckl_seawater_pressure,ctdpf_ckl_seawater_temperature,practical_salinity\n",
    );
    for i in 0..240 {
        let time = start + Duration::minutes(i);
        let depth = (i % 120) as f64 * 0.5;
        let temperature = if i == 190 { 99.0 } else { 12.0 - depth * 0.05 };
        let salinity = 33.0 + depth * 0.01;
        csv.push_str(&format!(
            "{},{:.1},{:.3},{:.3}\n",
            time.format("%Y-%m-%dT%H:%M:%S"),
            depth,
            temperature,
            salinity
        ));
    }
    csv
}

fn setup(root: &Path) -> Config {
    write(root, &format!("metadata/{REFDES}.json"), CATALOG);
    write(
        root,
        &format!("data/deployment0004_{REFDES}-recovered_wfp-ctdpf_ckl_wfp_instrument_recovered.csv"),
        &dataset_csv(),
    );
    write(
        root,
        "global_ranges.csv",
        &format!(
            "reference_designator,parameter,min,max\n\
             {REFDES},ctdpf_ckl_seawater_temperature,-5,35\n"
        ),
    );

    let mut config = Config::default();
    config.paths.metadata_dir = root.join("metadata");
    config.paths.output_dir = root.join("output");
    config.paths.global_ranges = Some(root.join("global_ranges.csv"));
    config
}

#[test]
fn test_full_run_from_directory() {
    let temp_dir = TempDir::new().unwrap();
    let config = setup(temp_dir.path());

    let files = discover_dataset_files(&[temp_dir.path().join("data")]).unwrap();
    assert_eq!(files.len(), 1);

    let stats = RangeProcessor::new(config)
        .unwrap()
        .process(files)
        .unwrap();

    assert_eq!(stats.designators_processed, 1);
    assert_eq!(stats.designators_failed, 0);
    assert_eq!(stats.variables_reported, 2);

    let report = temp_dir
        .path()
        .join(format!("output/CE/CE09OSPM/{REFDES}_data_ranges.csv"));
    let contents = fs::read_to_string(&report).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("parameter,deployments,depth_bin,count,mean,std,min,25%,50%,75%,max")
    );
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), stats.rows_written);
    assert!(rows.iter().all(|r| !r.starts_with("ctdpf_ckl_seawater_pressure")));
    // The 99 degree spike is removed by the global range
    assert!(!contents.contains("99.000000"));
}

#[test]
fn test_sigma_pass_writes_windows() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = setup(temp_dir.path());
    // Without the global range the spike survives to the sigma rule
    config.paths.global_ranges = None;
    config.pipeline = config.pipeline.with_sigma_pass();

    let files = discover_dataset_files(&[temp_dir.path().join("data")]).unwrap();
    let stats = RangeProcessor::new(config)
        .unwrap()
        .process(files)
        .unwrap();

    assert!(stats.sigma_windows >= 1);
    let windows = temp_dir
        .path()
        .join(format!("output/CE/CE09OSPM/{REFDES}_sigma_windows.csv"));
    let contents = fs::read_to_string(windows).unwrap();
    assert!(contents.contains(
        "ctdpf_ckl_seawater_temperature,2016-06-01T03:10:00Z,2016-06-01T03:10:00Z,sigma_rule"
    ));

    let report = fs::read_to_string(
        temp_dir
            .path()
            .join(format!("output/CE/CE09OSPM/{REFDES}_data_ranges.csv")),
    )
    .unwrap();
    assert!(!report.contains("99.000000"));
}

fn scenario_set() -> (ObservationSet, Vec<chrono::DateTime<Utc>>) {
    let t: Vec<_> = (0..5)
        .map(|i| Utc.with_ymd_and_hms(2016, 6, 1, i, 0, 0).unwrap())
        .collect();
    let fill = Some(-9999.0);
    let set = ObservationSet::new(
        "ctdpf_ckl_seawater_temperature",
        "ºC",
        fill,
        vec![
            Observation::new(t[0], 5.0, -9999.0, fill, 4),
            Observation::new(t[1], 12.0, 3.0, fill, 4),
            Observation::new(t[2], 22.0, 4.0, fill, 4),
            Observation::new(t[3], 31.0, 1e8, fill, 4),
        ],
    );
    (set, t)
}

#[test]
fn test_public_pipeline_scenario() {
    let (set, _) = scenario_set();
    let config = PipelineConfig::default();

    let outcome = apply_quality_filters(&set, &config, None, &[]);
    assert_eq!(outcome.trusted.len(), 2);
    assert_eq!(outcome.removed_by(FilterStage::FillValue), Some(1));

    let binning = bin_observations(&outcome.trusted, &config);
    let bins: Vec<DepthBin> = binning.statistics().map(|s| s.bin).collect();
    assert_eq!(bins, vec![DepthBin::new(10.0, 20.0), DepthBin::new(20.0, 30.0)]);
    assert!(binning.statistics().all(|s| s.count == 1 && s.std.is_none()));
    assert!(detect_outlier_windows(&binning, 3.0).windows.is_empty());

    let reduction = reduce_variable(&set, &config, None, &[]);
    assert_eq!(reduction.report_binning().unwrap().statistics().count(), 2);
}

#[test]
fn test_public_overlapping_windows() {
    let t: Vec<_> = (0..5)
        .map(|i| Utc.with_ymd_and_hms(2016, 6, 1, i, 0, 0).unwrap())
        .collect();
    let set = ObservationSet::new(
        "practical_salinity",
        "1",
        None,
        t.iter()
            .map(|&ts| Observation::new(ts, 10.0, 33.0, None, 4))
            .collect(),
    );
    let windows = [
        ExclusionWindow::new(t[0], t[2], WindowSource::PortalExport),
        ExclusionWindow::new(t[1], t[3], WindowSource::ReviewBoard),
    ];

    let kept = apply_windows(&set, &windows);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept.observations()[0].timestamp, t[4]);
}
