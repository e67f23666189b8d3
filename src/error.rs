//! Error handling for data-range processing.
//!
//! Provides error types with context for dataset reading, external metadata
//! lookups, configuration and report writing failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RangeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Data review metadata not found for {refdes} at {path}")]
    MetadataNotFound { refdes: String, path: PathBuf },

    #[error("Invalid format in file: {path} - {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("Unrecognised dataset file name: {path}")]
    UnrecognisedFileName { path: PathBuf },

    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Column '{column}' missing from {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Processing failed for {refdes}: {reason}")]
    DesignatorFailed { refdes: String, reason: String },
}

impl RangeError {
    /// Create an invalid format error
    pub fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid timestamp error
    pub fn invalid_timestamp(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing column error
    pub fn missing_column(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            path: path.into(),
            column: column.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a designator failure error
    pub fn designator_failed(refdes: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DesignatorFailed {
            refdes: refdes.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RangeError>;

/// Check if an error is critical enough to stop the whole run
///
/// Structural problems with one designator's inputs only abort that
/// designator. Configuration errors abort everything.
pub fn is_critical_error(error: &RangeError) -> bool {
    matches!(error, RangeError::Configuration { .. } | RangeError::Toml(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_critical_error() {
        let config_error = RangeError::configuration("zcell_size must be positive");
        let metadata_error = RangeError::MetadataNotFound {
            refdes: "CE09OSPM-WFP01-04-FLORTK000".to_string(),
            path: PathBuf::from("/tmp/missing.json"),
        };
        let io_error = RangeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "test",
        ));

        assert!(is_critical_error(&config_error));
        assert!(!is_critical_error(&metadata_error));
        assert!(!is_critical_error(&io_error));
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = RangeError::missing_column("/data/file.csv", "time");
        assert_eq!(err.to_string(), "Column 'time' missing from /data/file.csv");

        let err = RangeError::designator_failed("CE09OSPM-WFP01-04-FLORTK000", "no files");
        assert!(err.to_string().contains("CE09OSPM-WFP01-04-FLORTK000"));
    }
}
