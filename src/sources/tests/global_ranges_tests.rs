//! Tests for the global range table

use super::*;
use crate::error::RangeError;
use crate::sources::GlobalRangeLookup;
use crate::sources::global_ranges::GlobalRangeTable;
use tempfile::TempDir;

#[test]
fn test_missing_table_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let table = GlobalRangeTable::load(&temp_dir.path().join("absent.csv")).unwrap();
    assert!(table.is_empty());
}

#[test]
fn test_load_table_and_lookup() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "global_ranges.csv",
        &format!(
            "reference_designator,parameter,min,max\n\
             {TEST_REFDES},fluorometric_chlorophyll_a,0,50\n\
             {TEST_REFDES},optical_backscatter,,\n\
             CE09OSPM-WFP01-03-CTDPFK000,ctdpf_ckl_seawater_temperature,-5,35\n"
        ),
    );

    let table = GlobalRangeTable::load(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.global_range(&test_refdes(), "fluorometric_chlorophyll_a"),
        Some((0.0, 50.0))
    );
    // Empty bounds leave the variable without a range
    assert_eq!(table.global_range(&test_refdes(), "optical_backscatter"), None);
    assert_eq!(
        table.global_range(&test_refdes(), "ctdpf_ckl_seawater_temperature"),
        None
    );
}

#[test]
fn test_missing_required_column() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "global_ranges.csv",
        "reference_designator,parameter,min\nX,y,1\n",
    );
    let result = GlobalRangeTable::load(&path);
    assert!(matches!(result, Err(RangeError::MissingColumn { .. })));
}

#[test]
fn test_insert_swaps_reversed_bounds() {
    let mut table = GlobalRangeTable::default();
    table.insert(TEST_REFDES, "optical_backscatter", 2.0, -1.0);
    assert_eq!(
        table.global_range(&test_refdes(), "optical_backscatter"),
        Some((-1.0, 2.0))
    );
}
