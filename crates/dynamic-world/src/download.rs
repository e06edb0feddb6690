//! Composite raster export to Cloud Optimized GeoTIFF.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use forest_config::ForestConfig;
use mrv_common::DateRange;

use crate::calculation::prepare_query;
use crate::error::{DynamicWorldError, Result};
use crate::expression::SCALE_METERS;
use crate::grid::{meters_to_degrees, ExportGrid};
use crate::service::ClassificationService;

pub const DEFAULT_GDAL_TRANSLATE: &str = "gdal_translate";

/// Runs `gdal_translate` to turn a GeoTIFF into a COG.
#[derive(Debug, Clone)]
pub struct RasterConverter {
    program: PathBuf,
}

impl Default for RasterConverter {
    fn default() -> Self {
        Self::new(DEFAULT_GDAL_TRANSLATE)
    }
}

impl RasterConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Convert `source` into an LZW-compressed COG at `destination`.
    pub async fn to_cog(&self, source: &Path, destination: &Path) -> Result<()> {
        debug!(
            program = %self.program.display(),
            source = %source.display(),
            destination = %destination.display(),
            "Converting to COG"
        );

        let output = Command::new(&self.program)
            .arg(source)
            .arg(destination)
            .args(["-of", "COG", "-co", "COMPRESS=LZW"])
            .output()
            .await
            .map_err(|e| {
                DynamicWorldError::Conversion(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(DynamicWorldError::Conversion(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Project name as used in file names: spaces become underscores.
pub fn sanitize_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// `{name}_{start}_{end}.tif` and `{name}_{start}_{end}.cog.tif`.
pub fn output_filenames(name: &str, range: &DateRange) -> (String, String) {
    let stem = format!(
        "{}_{}_{}",
        sanitize_name(name),
        range.start_str(),
        range.end_str()
    );
    (format!("{}.tif", stem), format!("{}.cog.tif", stem))
}

/// Export the mode composite of `forest` between `start_date` and `end_date`
/// into `destination`, creating it if needed.
///
/// Writes the GeoTIFF returned by the service and its COG conversion next to
/// it, and returns the path of the COG. The grid uses a 10 m pixel size
/// expressed in degrees at the equator.
pub async fn download_single_date_image<S>(
    service: &S,
    converter: &RasterConverter,
    start_date: &str,
    end_date: &str,
    forest: &ForestConfig,
    destination: &Path,
) -> Result<PathBuf>
where
    S: ClassificationService + ?Sized,
{
    let (range, area) = prepare_query(start_date, end_date, forest)?;
    let grid = ExportGrid::for_bbox(&area.bbox(), meters_to_degrees(SCALE_METERS))?;

    fs::create_dir_all(destination).await?;
    let (tif_name, cog_name) = output_filenames(forest.name(), &range);
    let tif_path = destination.join(tif_name);
    let cog_path = destination.join(cog_name);

    let image = service.composite_geotiff(&range, &area, &grid).await?;
    fs::write(&tif_path, &image).await?;
    info!(
        path = %tif_path.display(),
        bytes = image.len(),
        width = grid.width,
        height = grid.height,
        "Wrote composite GeoTIFF"
    );

    converter.to_cog(&tif_path, &cog_path).await?;
    info!(path = %cog_path.display(), "Wrote COG");

    Ok(cog_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_filenames() {
        let range = DateRange::parse("2021-07-05", "2022-07-05").unwrap();
        let (tif, cog) = output_filenames("Cordillera Azul", &range);
        assert_eq!(tif, "Cordillera_Azul_2021-07-05_2022-07-05.tif");
        assert_eq!(cog, "Cordillera_Azul_2021-07-05_2022-07-05.cog.tif");
    }

    #[test]
    fn test_default_converter() {
        assert_eq!(RasterConverter::default().program(), Path::new("gdal_translate"));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let converter = RasterConverter::new(dir.path().join("no-such-gdal_translate"));

        let err = converter
            .to_cog(&dir.path().join("a.tif"), &dir.path().join("a.cog.tif"))
            .await
            .unwrap_err();
        assert!(matches!(err, DynamicWorldError::Conversion(_)), "{err}");
    }
}
