//! Dataset file discovery
//!
//! Inputs may be dataset files or directories. Directories are walked
//! recursively for `*.csv` files whose names follow the dataset export
//! convention; everything else is skipped with a debug message.

use crate::config::PipelineConfig;
use crate::error::{RangeError, Result};
use crate::models::{DatasetFile, ReferenceDesignator};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Expand the inputs into dataset files, preserving declaration order
///
/// Files found under one directory are sorted by path. A named file that
/// does not follow the naming convention is an error; unrecognised files
/// inside directories are skipped.
pub fn discover_dataset_files(inputs: &[PathBuf]) -> Result<Vec<DatasetFile>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(DatasetFile::from_path(input)?);
        } else if input.is_dir() {
            files.extend(discover_directory(input));
        } else {
            return Err(RangeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input not found: {}", input.display()),
            )));
        }
    }

    info!("Discovered {} dataset files", files.len());
    Ok(files)
}

fn discover_directory(dir: &Path) -> Vec<DatasetFile> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_csv_file(p))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| match DatasetFile::from_path(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

fn is_csv_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "csv")
}

/// Keep files matching the configured deployment and delivery method
pub fn select_files(files: Vec<DatasetFile>, config: &PipelineConfig) -> Vec<DatasetFile> {
    let total = files.len();
    let selected: Vec<DatasetFile> = files
        .into_iter()
        .filter(|f| config.deployment.is_none_or(|d| f.deployment == d))
        .filter(|f| config.method.as_deref().is_none_or(|m| f.method == m))
        .collect();

    if selected.len() < total {
        info!(
            "Selected {} of {} dataset files by deployment/method",
            selected.len(),
            total
        );
    }
    if selected.is_empty() && total > 0 {
        warn!("No dataset files match the deployment/method selection");
    }
    selected
}

/// Group files by reference designator in first-seen order
pub fn group_by_designator(
    files: Vec<DatasetFile>,
) -> Vec<(ReferenceDesignator, Vec<DatasetFile>)> {
    let mut groups: Vec<(ReferenceDesignator, Vec<DatasetFile>)> = Vec::new();
    for file in files {
        match groups.iter_mut().find(|(refdes, _)| *refdes == file.refdes) {
            Some((_, members)) => members.push(file),
            None => groups.push((file.refdes.clone(), vec![file])),
        }
    }
    groups
}
