//! Pixel grid for raster exports.

use serde_json::{json, Value};

use crate::area::BoundingBox;
use crate::error::{DynamicWorldError, Result};

/// Meters per degree of longitude at the equator (WGS84 semi-major axis).
pub const METERS_PER_DEGREE: f64 = 111_319.490_793_273_57;

/// Largest width or height the pixel endpoint will serve.
pub const MAX_PIXELS_PER_SIDE: u64 = 32_768;

/// Export CRS.
pub const EXPORT_CRS: &str = "EPSG:4326";

/// Pixel size in degrees for a pixel size in meters at the equator.
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// A north-up EPSG:4326 grid covering a bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportGrid {
    pub origin_lon: f64,
    pub origin_lat: f64,
    pub scale_deg: f64,
    pub width: u64,
    pub height: u64,
}

impl ExportGrid {
    /// Grid anchored at the north-west corner of `bbox`, rounded up to whole pixels.
    pub fn for_bbox(bbox: &BoundingBox, scale_deg: f64) -> Result<Self> {
        if !(scale_deg.is_finite() && scale_deg > 0.0) {
            return Err(DynamicWorldError::InvalidGeometry(format!(
                "invalid pixel size {}",
                scale_deg
            )));
        }

        let width = (bbox.width() / scale_deg).ceil().max(1.0) as u64;
        let height = (bbox.height() / scale_deg).ceil().max(1.0) as u64;

        if width > MAX_PIXELS_PER_SIDE || height > MAX_PIXELS_PER_SIDE {
            return Err(DynamicWorldError::RasterTooLarge {
                width,
                height,
                max: MAX_PIXELS_PER_SIDE,
            });
        }

        Ok(Self {
            origin_lon: bbox.min_lon,
            origin_lat: bbox.max_lat,
            scale_deg,
            width,
            height,
        })
    }

    /// `PixelGrid` object for `image:computePixels`.
    pub fn to_pixel_grid(&self) -> Value {
        json!({
            "crsCode": EXPORT_CRS,
            "affineTransform": {
                "scaleX": self.scale_deg,
                "shearX": 0.0,
                "translateX": self.origin_lon,
                "shearY": 0.0,
                "scaleY": -self.scale_deg,
                "translateY": self.origin_lat,
            },
            "dimensions": {
                "width": self.width,
                "height": self.height,
            }
        })
    }
}
