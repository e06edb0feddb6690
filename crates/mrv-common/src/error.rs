//! Error types for forest-mrv validation and calculations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using MrvError.
pub type MrvResult<T> = Result<T, MrvError>;

/// Primary error type for configuration, date and CO2 operations.
#[derive(Debug, Error)]
pub enum MrvError {
    // === Missing inputs ===
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("forest {0} does not correspond with an existing directory")]
    ForestNotFound(String),

    #[error("{file} must define a field named {field}")]
    MissingField { file: String, field: &'static str },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    // === Dates ===
    #[error("{label} must have format YYYY-mm-dd, got '{value}'")]
    BadDateFormat { label: String, value: String },

    #[error("{before} is before {after}")]
    DateOrdering {
        before: &'static str,
        after: &'static str,
    },

    // === CO2 factors ===
    #[error("{label} must contain a key named {key}")]
    KeyNotPresent { label: &'static str, key: &'static str },

    #[error("{key} is not one of {valid:?}")]
    UndefinedKey { key: String, valid: Vec<&'static str> },

    #[error("{key} must be {requirement}, got {value}")]
    InvalidCoefficient {
        key: String,
        value: f64,
        requirement: &'static str,
    },

    #[error("cannot redistribute {na} NA pixels: no classified pixels in the histogram")]
    NoClassifiedPixels { na: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MrvError {
    /// True for errors caused by a missing directory, file or descriptor field.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MrvError::NotFound { .. } | MrvError::ForestNotFound(_) | MrvError::MissingField { .. }
        )
    }

    /// True for errors caused by a present but invalid value.
    pub fn is_invalid_value(&self) -> bool {
        matches!(
            self,
            MrvError::BadDateFormat { .. }
                | MrvError::DateOrdering { .. }
                | MrvError::KeyNotPresent { .. }
                | MrvError::UndefinedKey { .. }
                | MrvError::InvalidCoefficient { .. }
                | MrvError::NoClassifiedPixels { .. }
                | MrvError::Parse { .. }
        )
    }

    /// Map an I/O error on `path` to `NotFound` when the file is absent.
    pub fn from_io(err: std::io::Error, what: &'static str, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            MrvError::NotFound {
                what,
                path: path.into(),
            }
        } else {
            MrvError::Io(err)
        }
    }
}
