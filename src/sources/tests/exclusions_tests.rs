//! Tests for the exclusion window sources

use super::*;
use crate::models::{ExclusionWindow, WindowSource};
use crate::sources::ExclusionSource;
use crate::sources::exclusions::{
    ExclusionSources, LocalExclusionFiles, PortalExport, ReviewBoardExport,
};
use chrono::DateTime;
use tempfile::TempDir;

fn local_dir() -> String {
    format!("CE/CE09OSPM/{TEST_REFDES}/time_to_exclude")
}

#[test]
fn test_local_directory_layout() {
    let dir = LocalExclusionFiles::directory(Path::new("/data/excl"), &test_refdes());
    assert_eq!(
        dir,
        PathBuf::from(format!("/data/excl/{}", local_dir()))
    );
}

#[test]
fn test_local_files_missing_directory_yields_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let files = LocalExclusionFiles::load(temp_dir.path(), &test_refdes()).unwrap();
    assert!(files.is_empty());
    assert!(files.windows(&test_refdes(), "optical_backscatter").is_empty());
}

#[test]
fn test_local_files_parse_dates_instants_and_ranges() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        &format!("{}/flort.csv", local_dir()),
        "parameter,time_to_exclude\n\
         optical_backscatter,\"2015-05-01, 2015-06-01T00:00:00/2015-06-03T12:00:00\"\n\
         fluorometric_chlorophyll_a,2015-07-04T06:30:00\n",
    );
    write_file(
        temp_dir.path(),
        &format!("{}/.hidden.csv", local_dir()),
        "parameter,time_to_exclude\noptical_backscatter,2016-01-01\n",
    );

    let files = LocalExclusionFiles::load(temp_dir.path(), &test_refdes()).unwrap();
    assert_eq!(files.len(), 3);

    let windows = files.windows(&test_refdes(), "optical_backscatter");
    assert_eq!(windows.len(), 2);
    assert!(windows.iter().all(|w| w.source == WindowSource::LocalCsv));
    // A bare date covers the whole day
    assert!(windows[0].contains(utc(2015, 5, 1, 0, 0, 0)));
    assert!(windows[0].contains(utc(2015, 5, 1, 23, 59, 59)));
    assert!(!windows[0].contains(utc(2015, 5, 2, 0, 0, 1)));
    assert_eq!(windows[1].start, utc(2015, 6, 1, 0, 0, 0));
    assert_eq!(windows[1].end, utc(2015, 6, 3, 12, 0, 0));

    let chl = files.windows(&test_refdes(), "fluorometric_chlorophyll_a");
    assert_eq!(chl.len(), 1);
    assert_eq!(chl[0].start, chl[0].end);
}

#[test]
fn test_local_files_unnamed_first_column_and_bad_entries() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        &format!("{}/flort.csv", local_dir()),
        "variable,time_to_exclude\n\
         optical_backscatter,\"not-a-date, 2015-05-01\"\n",
    );

    let files = LocalExclusionFiles::load(temp_dir.path(), &test_refdes()).unwrap();
    let windows = files.windows(&test_refdes(), "optical_backscatter");
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].start, utc(2015, 5, 1, 0, 0, 0));
}

#[test]
fn test_review_board_filters_type_and_designator() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "annotations.csv",
        &format!(
            "type,reference_designator,start_date,end_date\n\
             exclusion,CE09OSPM,2015-05-01T00:00:00,2015-05-02T00:00:00\n\
             exclusion,CE09OSPM-WFP01,2015-06-01T00:00:00,2015-06-02T00:00:00\n\
             exclusion,{TEST_REFDES},2015-07-01T00:00:00,\n\
             note,{TEST_REFDES},2015-08-01T00:00:00,2015-08-02T00:00:00\n\
             exclusion,CE02SHSP-SP001-04-FLORTJ000,2015-09-01T00:00:00,2015-09-02T00:00:00\n"
        ),
    );

    let export = ReviewBoardExport::load(&path).unwrap();
    assert_eq!(export.len(), 4);

    let windows = export.windows(&test_refdes(), "optical_backscatter");
    assert_eq!(windows.len(), 3);
    assert!(windows.iter().all(|w| w.source == WindowSource::ReviewBoard));
    // Open-ended exclusion runs to the end of time
    assert_eq!(windows[2].start, utc(2015, 7, 1, 0, 0, 0));
    assert_eq!(windows[2].end, DateTime::<Utc>::MAX_UTC);
}

#[test]
fn test_review_board_missing_file_yields_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let export = ReviewBoardExport::load(&temp_dir.path().join("absent.csv")).unwrap();
    assert!(export.is_empty());
}

#[test]
fn test_portal_export_optional_parameter_column() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "portal.csv",
        &format!(
            "reference_designator,start_date,end_date,parameter\n\
             {TEST_REFDES},2015-05-01T00:00:00,2015-05-02T00:00:00,optical_backscatter\n\
             {TEST_REFDES},2015-06-01T00:00:00,2015-06-02T00:00:00,\n"
        ),
    );

    let export = PortalExport::load(&path).unwrap();
    assert_eq!(export.len(), 2);
    assert_eq!(export.windows(&test_refdes(), "optical_backscatter").len(), 2);
    assert_eq!(
        export
            .windows(&test_refdes(), "fluorometric_chlorophyll_a")
            .len(),
        1
    );
}

#[test]
fn test_exclusion_sources_union() {
    let local = LocalExclusionFiles::from_entries(vec![(
        "optical_backscatter".to_string(),
        ExclusionWindow::new(
            utc(2015, 5, 1, 0, 0, 0),
            utc(2015, 5, 2, 0, 0, 0),
            WindowSource::LocalCsv,
        ),
    )]);
    let review = ReviewBoardExport::default();

    let sources = ExclusionSources::new()
        .with_source(&local)
        .with_source(&review);
    assert_eq!(sources.collect(&test_refdes(), "optical_backscatter").len(), 1);
    assert!(sources
        .collect(&test_refdes(), "fluorometric_chlorophyll_a")
        .is_empty());
    assert!(ExclusionSources::new()
        .collect(&test_refdes(), "optical_backscatter")
        .is_empty());
}
