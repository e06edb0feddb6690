//! Forest project configuration.
//!
//! A project directory holds `forest_config.yml`, the project area as a
//! GeoJSON FeatureCollection, and the CO2 coefficients (inline or in a
//! separate file). [`load_config`] reads and validates all three.

pub mod loader;

pub use loader::{
    load_config, load_feature_collection, validate_forest_names, ForestConfig,
    DEFAULT_PROJECTS_DIR, FOREST_CONFIG_FILENAME,
};
