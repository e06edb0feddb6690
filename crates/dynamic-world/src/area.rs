//! Project area as sent to Earth Engine.

use geojson::{FeatureCollection, Geometry, PolygonType, Value};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{DynamicWorldError, Result};

/// Geographic bounding box in degrees (EPSG:4326).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

/// All polygons of a project's FeatureCollection, treated as one multipolygon.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    polygons: Vec<PolygonType>,
    bbox: BoundingBox,
}

impl AreaOfInterest {
    /// Collect the Polygon and MultiPolygon geometries of every feature.
    ///
    /// Other geometry types are ignored; an area without polygons is an error.
    pub fn from_feature_collection(collection: &FeatureCollection) -> Result<Self> {
        let geometries = collection
            .features
            .iter()
            .filter_map(|f| f.geometry.clone())
            .collect();
        let polygons = only_polys(geometries);
        trace!(polygons = polygons.len(), "filtered feature collection to polygons");

        if polygons.is_empty() {
            return Err(DynamicWorldError::EmptyArea);
        }

        let bbox = bounding_box(&polygons)?;
        Ok(Self { polygons, bbox })
    }

    pub fn polygons(&self) -> &[PolygonType] {
        &self.polygons
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }
}

fn only_polys(geometries: Vec<Geometry>) -> Vec<PolygonType> {
    geometries
        .into_iter()
        .filter_map(|g| match g.value {
            Value::Polygon(p) => Some(vec![p]),
            Value::MultiPolygon(mp) => Some(mp),
            Value::GeometryCollection(gc) => Some(only_polys(gc)),
            _ => None,
        })
        .flatten()
        .collect()
}

fn bounding_box(polygons: &[PolygonType]) -> Result<BoundingBox> {
    let mut bbox = BoundingBox {
        min_lon: f64::INFINITY,
        min_lat: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
        max_lat: f64::NEG_INFINITY,
    };

    for position in polygons.iter().flatten().flatten() {
        let (lon, lat) = match position.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => (*lon, *lat),
            other => {
                return Err(DynamicWorldError::InvalidGeometry(format!(
                    "bad position {:?}",
                    other
                )))
            }
        };
        bbox.min_lon = bbox.min_lon.min(lon);
        bbox.min_lat = bbox.min_lat.min(lat);
        bbox.max_lon = bbox.max_lon.max(lon);
        bbox.max_lat = bbox.max_lat.max(lat);
    }

    if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
        return Err(DynamicWorldError::InvalidGeometry(
            "polygons enclose no area".to_string(),
        ));
    }
    Ok(bbox)
}
