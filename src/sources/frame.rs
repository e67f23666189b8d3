//! Polars helpers for the CSV-backed sources
//!
//! Columns are pulled out of a `DataFrame` as plain vectors. Numeric nulls
//! become NaN so that missing samples flow into the NaN rejection stage.

use crate::error::Result;
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// Read a CSV file with a header row, inferring types over every row
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// True when the frame has a column called `name`
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Column as `f64`, nulls and unparseable cells as NaN; `None` if absent
pub fn float_column(df: &DataFrame, name: &str) -> Result<Option<Vec<f64>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    Ok(Some(values))
}

/// Column as trimmed strings, nulls as `None`; `None` if absent
pub fn string_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    Ok(Some(strings_of(column)?))
}

/// First column as strings, whatever its header
pub fn first_string_column(df: &DataFrame) -> Result<Option<Vec<Option<String>>>> {
    match df.get_columns().first() {
        Some(column) => Ok(Some(strings_of(column)?)),
        None => Ok(None),
    }
}

fn strings_of(column: &Column) -> Result<Vec<Option<String>>> {
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .collect();
    Ok(values)
}
