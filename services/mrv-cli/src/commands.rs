//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use carbon::forest_co2_tons;
use dynamic_world::{
    download_single_date_image, single_date_calculation, ClassificationService, EarthEngineClient,
    EarthEngineConfig, RasterConverter,
};
use forest_config::{load_config, validate_forest_names, ForestConfig};
use mrv_common::DateRange;

use crate::report::{ExportReport, ForestReport, ProjectSummary};

/// A project together with the directory name it was requested by.
#[derive(Debug, Clone)]
pub struct Project {
    pub forest: String,
    pub config: ForestConfig,
}

/// Resolve every name first, then load each project.
pub fn load_forests(forests: &[String], forests_dir: &Path) -> Result<Vec<Project>> {
    let directories = validate_forest_names(forests, forests_dir)?;

    forests
        .iter()
        .zip(directories)
        .map(|(forest, dir)| {
            let config = load_config(&dir)
                .with_context(|| format!("Failed to load forest project {}", forest))?;
            Ok(Project {
                forest: forest.clone(),
                config,
            })
        })
        .collect()
}

/// Everything `calculate` and `download` check before contacting Earth Engine.
pub fn prepare_query(
    forests: &[String],
    forests_dir: &Path,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<Project>> {
    let projects = load_forests(forests, forests_dir)?;
    DateRange::parse(start_date, end_date)?;
    Ok(projects)
}

pub fn validate(forests: &[String], forests_dir: &Path) -> Result<Vec<ProjectSummary>> {
    let projects = load_forests(forests, forests_dir)?;
    info!(count = projects.len(), "All forest projects are valid");

    Ok(projects
        .into_iter()
        .map(|project| ProjectSummary {
            name: project.config.name().to_string(),
            start_date: project.config.start_date().to_string(),
            features: project.config.geojson_info().features.len(),
            co2_factor: project.config.co2_factor_info().to_map(),
            forest: project.forest,
        })
        .collect())
}

pub async fn connect(config: EarthEngineConfig) -> Result<EarthEngineClient> {
    EarthEngineClient::initialize(config)
        .await
        .context("Failed to authenticate with Earth Engine")
}

pub async fn calculate<S>(
    service: &S,
    projects: &[Project],
    start_date: &str,
    end_date: &str,
) -> Result<Vec<ForestReport>>
where
    S: ClassificationService + ?Sized,
{
    let mut reports = Vec::with_capacity(projects.len());

    for project in projects {
        let pixel_counts = single_date_calculation(service, start_date, end_date, &project.config)
            .await
            .with_context(|| format!("Failed to classify {}", project.forest))?;
        let co2_tons = forest_co2_tons(&pixel_counts, &project.config)
            .with_context(|| format!("Failed to estimate CO2 for {}", project.forest))?;

        info!(forest = %project.forest, co2_tons, "Estimated retained CO2");

        reports.push(ForestReport {
            forest: project.forest.clone(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            pixel_counts,
            co2_tons,
        });
    }

    Ok(reports)
}

/// Export each project to `output_dir`, or to `<project dir>/<end_date>` when unset.
pub async fn download<S>(
    service: &S,
    gdal_translate: &Path,
    projects: &[Project],
    start_date: &str,
    end_date: &str,
    output_dir: Option<&Path>,
) -> Result<Vec<ExportReport>>
where
    S: ClassificationService + ?Sized,
{
    let converter = RasterConverter::new(gdal_translate);
    let mut exports = Vec::with_capacity(projects.len());

    for project in projects {
        let destination = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => project.config.project_dir().join(end_date),
        };

        let cog_path = download_single_date_image(
            service,
            &converter,
            start_date,
            end_date,
            &project.config,
            &destination,
        )
        .await
        .with_context(|| format!("Failed to export {}", project.forest))?;

        exports.push(ExportReport {
            forest: project.forest.clone(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            cog_path,
        });
    }

    Ok(exports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use dynamic_world::{AreaOfInterest, ExportGrid, RawHistogram};
    use mrv_common::{LandCover, MrvError};
    use test_utils::{assert_approx_eq, projects_dir};

    /// Every class code and null once; GeoTIFF requests return a stub.
    #[derive(Default)]
    struct UniformService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClassificationService for UniformService {
        async fn frequency_histogram(
            &self,
            _range: &DateRange,
            _area: &AreaOfInterest,
        ) -> dynamic_world::Result<RawHistogram> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(["0", "1", "2", "3", "4", "5", "6", "7", "8", "null"]
                .iter()
                .map(|code| (code.to_string(), 1.0))
                .collect())
        }

        async fn composite_geotiff(
            &self,
            _range: &DateRange,
            _area: &AreaOfInterest,
            _grid: &ExportGrid,
        ) -> dynamic_world::Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(b"II*\0"))
        }
    }

    fn names(forests: &[&str]) -> Vec<String> {
        forests.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_fixture_projects() {
        let summaries = validate(&names(&["CordilleraAzul", "Sample"]), &projects_dir()).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].forest, "CordilleraAzul");
        assert_eq!(summaries[0].name, "Cordillera Azul");
        assert_eq!(summaries[1].start_date, "2021-07-05");
        assert_eq!(summaries[1].co2_factor["factor_pixel"], 100.0);
    }

    #[test]
    fn test_unknown_forest_fails_before_loading() {
        let err = load_forests(&names(&["Sample", "AAA"]), &projects_dir()).unwrap_err();
        let mrv = err.downcast_ref::<MrvError>().unwrap();
        assert!(matches!(mrv, MrvError::ForestNotFound(name) if name == "AAA"));
    }

    #[test]
    fn test_invalid_project_is_reported() {
        let err = load_forests(&names(&["Invalid/NoOtherKey"]), &projects_dir()).unwrap_err();
        assert!(err.to_string().contains("Invalid/NoOtherKey"));
        assert!(err.root_cause().to_string().contains("other"));
    }

    #[test]
    fn test_dates_checked_before_connecting() {
        let forests = names(&["Sample"]);

        let err = prepare_query(&forests, &projects_dir(), "05/07/2021", "2022-07-05").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MrvError>(),
            Some(MrvError::BadDateFormat { .. })
        ));

        let err = prepare_query(&forests, &projects_dir(), "2022-07-05", "2021-07-05").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MrvError>(),
            Some(MrvError::DateOrdering { .. })
        ));

        let projects = prepare_query(&forests, &projects_dir(), "2021-07-05", "2022-07-05").unwrap();
        assert_eq!(projects.len(), 1);
    }

    #[tokio::test]
    async fn test_calculate_reports() {
        let projects = load_forests(&names(&["Sample"]), &projects_dir()).unwrap();
        let service = UniformService::default();

        let reports = calculate(&service, &projects, "2021-07-05", "2022-07-05")
            .await
            .unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].pixel_counts.len(), 10);
        assert_eq!(reports[0].pixel_counts[&LandCover::Na], 1);
        assert_approx_eq!(reports[0].co2_tons, 1.0 + 1.0 / 9.0, 1e-12);
    }

    #[tokio::test]
    async fn test_calculate_bad_dates_never_query() {
        let projects = load_forests(&names(&["Sample"]), &projects_dir()).unwrap();
        let service = UniformService::default();

        let err = calculate(&service, &projects, "2022-07-05", "2021-07-05")
            .await
            .unwrap_err();
        assert_eq!(err.root_cause().to_string(), "end_date is before start_date");
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_default_destination() {
        let forests_dir = test_utils::temp_test_dir();
        let tools = test_utils::temp_test_dir();
        let project_dir = forests_dir.path().join("Sample");
        std::fs::create_dir(&project_dir).unwrap();
        test_utils::ProjectFixture::sample().write_to(&project_dir);
        let gdal = test_utils::write_script(tools.path(), "gdal_translate", "cp \"$1\" \"$2\"");

        let projects = load_forests(&names(&["Sample"]), forests_dir.path()).unwrap();
        let exports = download(
            &UniformService::default(),
            &gdal,
            &projects,
            "2021-07-05",
            "2022-07-05",
            None,
        )
        .await
        .unwrap();

        assert_eq!(
            exports[0].cog_path,
            project_dir
                .join("2022-07-05")
                .join("Sample_2021-07-05_2022-07-05.cog.tif")
        );
        assert!(exports[0].cog_path.exists());
    }
}
