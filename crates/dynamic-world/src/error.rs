//! Error types for the Dynamic World adapter.

use mrv_common::MrvError;
use thiserror::Error;

/// Errors that can occur while querying or exporting Dynamic World data.
#[derive(Error, Debug)]
pub enum DynamicWorldError {
    #[error(transparent)]
    Validation(#[from] MrvError),

    #[error("invalid service account credentials: {0}")]
    Credentials(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Earth Engine returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("unexpected Earth Engine response: {0}")]
    UnexpectedResponse(String),

    #[error("area of interest contains no polygons")]
    EmptyArea,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("export grid of {width}x{height} pixels exceeds the {max} pixel limit per side")]
    RasterTooLarge { width: u64, height: u64, max: u64 },

    #[error("COG conversion failed: {0}")]
    Conversion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Dynamic World operations.
pub type Result<T> = std::result::Result<T, DynamicWorldError>;
