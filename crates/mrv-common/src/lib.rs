//! Common types and utilities shared across all forest-mrv crates.

pub mod co2_factor;
pub mod error;
pub mod labels;
pub mod logging;
pub mod time;

pub use co2_factor::{Co2Factors, FACTOR_PIXEL_LABEL, OTHER_LABEL};
pub use error::{MrvError, MrvResult};
pub use labels::{LandCover, PixelCounts};
pub use time::{validate_dates, warn_if_before_project_start, DateRange};
