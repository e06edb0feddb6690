//! Dynamic World land-cover data through the Earth Engine REST API.
//!
//! The two entry points are [`single_date_calculation`], which counts the
//! pixels of each land-cover class inside a project, and
//! [`download_single_date_image`], which exports the same composite as a
//! Cloud Optimized GeoTIFF. Both take any [`ClassificationService`];
//! [`EarthEngineClient`] is the production implementation.

pub mod area;
pub mod calculation;
pub mod client;
pub mod credentials;
pub mod download;
pub mod error;
pub mod expression;
pub mod grid;
pub mod service;

pub use area::{AreaOfInterest, BoundingBox};
pub use calculation::{remap_histogram, single_date_calculation};
pub use client::{EarthEngineClient, EarthEngineConfig, DEFAULT_API_URL};
pub use credentials::{AccessToken, Credentials, ServiceAccountKey, SERVICE_ACCOUNT_ENV};
pub use download::{download_single_date_image, RasterConverter, DEFAULT_GDAL_TRANSLATE};
pub use error::{DynamicWorldError, Result};
pub use grid::ExportGrid;
pub use service::{ClassificationService, RawHistogram};
