//! Loading of `forest_config.yml` project descriptors.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use geojson::{FeatureCollection, GeoJson};
use serde::Deserialize;
use tracing::{debug, info};

use mrv_common::time::parse_date;
use mrv_common::{Co2Factors, MrvError, MrvResult};

/// Fixed name of the descriptor inside every project directory.
pub const FOREST_CONFIG_FILENAME: &str = "forest_config.yml";

/// Default base directory holding one sub-directory per project.
pub const DEFAULT_PROJECTS_DIR: &str = "forests";

/// On-disk shape of `forest_config.yml`.
///
/// Every field is optional here so a missing one is reported by name
/// instead of as a YAML parse failure.
#[derive(Debug, Deserialize)]
struct ForestDescriptor {
    name: Option<String>,
    geojson: Option<String>,
    co2_factor: Option<Co2FactorSource>,
    start_date: Option<String>,
}

/// `co2_factor` is either the mapping itself or a path to a JSON/YAML file holding it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Co2FactorSource {
    Inline(BTreeMap<String, f64>),
    File(String),
}

/// A validated forest project.
///
/// Built once by [`load_config`]; fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    name: String,
    geojson_info: FeatureCollection,
    co2_factor_info: Co2Factors,
    start_date: NaiveDate,
    project_dir: PathBuf,
}

impl ForestConfig {
    /// Validate the already-loaded parts of a project.
    pub fn new(
        name: impl Into<String>,
        geojson_info: FeatureCollection,
        co2_factor: &BTreeMap<String, f64>,
        start_date: &str,
        project_dir: impl Into<PathBuf>,
    ) -> MrvResult<Self> {
        let co2_factor_info = Co2Factors::from_map(co2_factor)?;
        let start_date = parse_date("start_date", start_date)?;

        Ok(Self {
            name: name.into(),
            geojson_info,
            co2_factor_info,
            start_date,
            project_dir: project_dir.into(),
        })
    }

    /// Name of the forest/project.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project area.
    pub fn geojson_info(&self) -> &FeatureCollection {
        &self.geojson_info
    }

    /// Coefficients used to estimate retained CO2.
    pub fn co2_factor_info(&self) -> &Co2Factors {
        &self.co2_factor_info
    }

    /// Date the reforestation began.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Directory the project was loaded from.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}

/// Load and validate the project stored in `directory_path`.
///
/// The directory must contain `forest_config.yml` with the fields
/// `name`, `geojson` (path relative to the directory), `co2_factor`
/// (inline mapping or relative path; must define `other` and `factor_pixel`)
/// and `start_date` (`YYYY-mm-dd`).
pub fn load_config<P: AsRef<Path>>(directory_path: P) -> MrvResult<ForestConfig> {
    let directory = directory_path.as_ref();
    if !directory.is_dir() {
        return Err(MrvError::NotFound {
            what: "forest directory",
            path: directory.to_path_buf(),
        });
    }

    let descriptor_path = directory.join(FOREST_CONFIG_FILENAME);
    let content = fs::read_to_string(&descriptor_path)
        .map_err(|e| MrvError::from_io(e, "forest config", &descriptor_path))?;
    let descriptor: ForestDescriptor =
        serde_yaml::from_str(&content).map_err(|e| MrvError::Parse {
            path: descriptor_path.clone(),
            message: e.to_string(),
        })?;

    let missing = |field: &'static str| MrvError::MissingField {
        file: descriptor_path.display().to_string(),
        field,
    };
    let name = descriptor.name.ok_or_else(|| missing("name"))?;
    let geojson = descriptor.geojson.ok_or_else(|| missing("geojson"))?;
    let co2_factor = descriptor.co2_factor.ok_or_else(|| missing("co2_factor"))?;
    let start_date = descriptor.start_date.ok_or_else(|| missing("start_date"))?;

    let geojson_info = load_feature_collection(&directory.join(geojson))?;

    let co2_factor = match co2_factor {
        Co2FactorSource::Inline(map) => map,
        Co2FactorSource::File(file) => load_co2_factor_file(&directory.join(file))?,
    };

    let config = ForestConfig::new(name, geojson_info, &co2_factor, &start_date, directory)?;

    info!(
        forest = %config.name,
        features = config.geojson_info.features.len(),
        start_date = %start_date,
        "Loaded forest configuration"
    );

    Ok(config)
}

/// Read a GeoJSON file that must hold a FeatureCollection.
pub fn load_feature_collection(path: &Path) -> MrvResult<FeatureCollection> {
    let content =
        fs::read_to_string(path).map_err(|e| MrvError::from_io(e, "geojson file", path))?;

    let parse_error = |message: String| MrvError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match content.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(collection)) => Ok(collection),
        Ok(_) => Err(parse_error("expected a GeoJSON FeatureCollection".to_string())),
        Err(e) => Err(parse_error(e.to_string())),
    }
}

/// Read a coefficient mapping from a `.json`, `.yml` or `.yaml` file.
fn load_co2_factor_file(path: &Path) -> MrvResult<BTreeMap<String, f64>> {
    let content =
        fs::read_to_string(path).map_err(|e| MrvError::from_io(e, "co2 factor file", path))?;

    debug!(path = %path.display(), "Reading co2 factor file");

    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yml") | Some("yaml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| MrvError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Check every forest name is an existing directory under `base_directory`.
///
/// Returns the resolved project directories in input order.
pub fn validate_forest_names<P: AsRef<Path>>(
    forests: &[String],
    base_directory: P,
) -> MrvResult<Vec<PathBuf>> {
    forests
        .iter()
        .map(|forest_name| {
            let forest_path = base_directory.as_ref().join(forest_name);
            if forest_path.is_dir() {
                Ok(forest_path)
            } else {
                Err(MrvError::ForestNotFound(forest_name.clone()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_accepts_inline_mapping() {
        let yaml = "name: a\ngeojson: a.geojson\nco2_factor:\n  other: 0\n  factor_pixel: 100\nstart_date: \"2021-01-01\"\n";
        let descriptor: ForestDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(descriptor.co2_factor, Some(Co2FactorSource::Inline(_))));
    }

    #[test]
    fn test_descriptor_accepts_file_reference() {
        let yaml = "name: a\ngeojson: a.geojson\nco2_factor: factors.json\nstart_date: \"2021-01-01\"\n";
        let descriptor: ForestDescriptor = serde_yaml::from_str(yaml).unwrap();
        match descriptor.co2_factor {
            Some(Co2FactorSource::File(file)) => assert_eq!(file, "factors.json"),
            other => panic!("unexpected co2_factor: {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_unquoted_date_is_a_string() {
        let yaml = "start_date: 2021-07-05\n";
        let descriptor: ForestDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(descriptor.start_date.as_deref(), Some("2021-07-05"));
    }
}
