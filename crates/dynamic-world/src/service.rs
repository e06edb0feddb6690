//! Seam between the Dynamic World operations and the remote service.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;

use mrv_common::DateRange;

use crate::area::AreaOfInterest;
use crate::error::Result;
use crate::grid::ExportGrid;

/// Histogram as returned by the service: class code (or `"null"`) to pixel count.
pub type RawHistogram = BTreeMap<String, f64>;

/// Remote land-cover classification backend.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Frequency histogram of the per-pixel mode label over `range`, within `area`.
    async fn frequency_histogram(
        &self,
        range: &DateRange,
        area: &AreaOfInterest,
    ) -> Result<RawHistogram>;

    /// The same mode composite, clipped to `area`, rendered as a GeoTIFF on `grid`.
    async fn composite_geotiff(
        &self,
        range: &DateRange,
        area: &AreaOfInterest,
        grid: &ExportGrid,
    ) -> Result<Bytes>;
}
