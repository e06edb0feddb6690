//! Common test fixtures for forest-mrv tests.
//!
//! Provides the coefficient mappings and geometry used by the on-disk
//! fixture projects, and a builder for throwaway project directories.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

/// Coefficients of the CordilleraAzul fixture project.
pub fn cordillera_co2_factors() -> Value {
    json!({
        "trees": 591.85,
        "grass": 6,
        "bare": 6,
        "crops": 11.5,
        "flooded_vegetation": 6,
        "other": 0,
        "factor_pixel": 100
    })
}

/// Coefficients of the Sample fixture project: only trees carry weight.
pub fn sample_co2_factors() -> Value {
    json!({
        "trees": 100,
        "other": 0,
        "factor_pixel": 100
    })
}

/// A small square FeatureCollection (about 1.1 km on a side) near the equator.
pub fn sample_feature_collection() -> Value {
    square_feature_collection(-76.50, -7.50, 0.01)
}

/// A FeatureCollection holding one square polygon with its south-west corner at (`lon`, `lat`).
pub fn square_feature_collection(lon: f64, lat: f64, size: f64) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [lon, lat],
                    [lon + size, lat],
                    [lon + size, lat + size],
                    [lon, lat + size],
                    [lon, lat]
                ]]
            }
        }]
    })
}

/// How the descriptor references its CO2 coefficients.
#[derive(Debug, Clone)]
enum Co2FactorFixture {
    Inline(Value),
    File { filename: String, contents: Value },
    MissingFile(String),
}

/// Builder for a forest project directory inside a temporary directory.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    name: String,
    geojson: Option<Value>,
    co2_factor: Co2FactorFixture,
    start_date: String,
    omitted: Vec<&'static str>,
}

impl ProjectFixture {
    pub const GEOJSON_FILENAME: &'static str = "area.geojson";

    /// A valid project equivalent to the Sample fixture.
    pub fn sample() -> Self {
        Self {
            name: "Sample".to_string(),
            geojson: Some(sample_feature_collection()),
            co2_factor: Co2FactorFixture::Inline(sample_co2_factors()),
            start_date: "2021-07-05".to_string(),
            omitted: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn start_date(mut self, start_date: &str) -> Self {
        self.start_date = start_date.to_string();
        self
    }

    pub fn geojson(mut self, geojson: Value) -> Self {
        self.geojson = Some(geojson);
        self
    }

    /// Reference a geometry file that is never written.
    pub fn without_geojson_file(mut self) -> Self {
        self.geojson = None;
        self
    }

    pub fn inline_co2_factor(mut self, factors: Value) -> Self {
        self.co2_factor = Co2FactorFixture::Inline(factors);
        self
    }

    pub fn co2_factor_file(mut self, filename: &str, factors: Value) -> Self {
        self.co2_factor = Co2FactorFixture::File {
            filename: filename.to_string(),
            contents: factors,
        };
        self
    }

    /// Reference a coefficient file that is never written.
    pub fn missing_co2_factor_file(mut self, filename: &str) -> Self {
        self.co2_factor = Co2FactorFixture::MissingFile(filename.to_string());
        self
    }

    /// Leave `field` out of `forest_config.yml`.
    pub fn omit_field(mut self, field: &'static str) -> Self {
        self.omitted.push(field);
        self
    }

    /// Write the project into `dir`, which must exist.
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        if let Some(geojson) = &self.geojson {
            std::fs::write(dir.join(Self::GEOJSON_FILENAME), geojson.to_string())
                .expect("Failed to write geojson fixture");
        }

        let co2_line = match &self.co2_factor {
            Co2FactorFixture::Inline(factors) => factors.to_string(),
            Co2FactorFixture::File { filename, contents } => {
                std::fs::write(dir.join(filename), contents.to_string())
                    .expect("Failed to write co2 factor fixture");
                format!("\"{}\"", filename)
            }
            Co2FactorFixture::MissingFile(filename) => format!("\"{}\"", filename),
        };

        let fields = [
            ("name", format!("\"{}\"", self.name)),
            ("geojson", format!("\"{}\"", Self::GEOJSON_FILENAME)),
            ("co2_factor", co2_line),
            ("start_date", format!("\"{}\"", self.start_date)),
        ];
        let descriptor: String = fields
            .iter()
            .filter(|(key, _)| !self.omitted.contains(key))
            .map(|(key, value)| format!("{}: {}\n", key, value))
            .collect();

        std::fs::write(dir.join("forest_config.yml"), descriptor)
            .expect("Failed to write forest_config.yml fixture");
        dir.to_path_buf()
    }

    /// Write the project into a fresh temporary directory.
    pub fn write(&self) -> tempfile::TempDir {
        let dir = crate::temp_test_dir_with_prefix("forest_project_");
        self.write_to(dir.path());
        dir
    }
}

/// Write an executable shell script, e.g. a stand-in for `gdal_translate`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    let mut permissions = std::fs::metadata(&path)
        .expect("Failed to stat script")
        .permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("Failed to chmod script");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_fixture_writes_descriptor() {
        let dir = ProjectFixture::sample().write();
        let descriptor = std::fs::read_to_string(dir.path().join("forest_config.yml")).unwrap();
        assert!(descriptor.contains("name: \"Sample\""));
        assert!(descriptor.contains("start_date: \"2021-07-05\""));
        assert!(dir.path().join(ProjectFixture::GEOJSON_FILENAME).exists());
    }

    #[test]
    fn test_omit_field() {
        let dir = ProjectFixture::sample().omit_field("start_date").write();
        let descriptor = std::fs::read_to_string(dir.path().join("forest_config.yml")).unwrap();
        assert!(!descriptor.contains("start_date"));
    }
}
