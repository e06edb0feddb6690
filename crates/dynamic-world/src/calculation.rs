//! Land-cover pixel counts for a project over a date window.

use tracing::{info, warn};

use forest_config::ForestConfig;
use mrv_common::{warn_if_before_project_start, DateRange, LandCover, PixelCounts};

use crate::area::AreaOfInterest;
use crate::error::{DynamicWorldError, Result};
use crate::service::{ClassificationService, RawHistogram};

/// Validated inputs shared by the calculation and the raster export.
pub(crate) fn prepare_query(
    start_date: &str,
    end_date: &str,
    forest: &ForestConfig,
) -> Result<(DateRange, AreaOfInterest)> {
    let range = DateRange::parse(start_date, end_date)?;
    warn_if_before_project_start(&range, forest.start_date());
    let area = AreaOfInterest::from_feature_collection(forest.geojson_info())?;
    Ok((range, area))
}

/// Translate service histogram keys into land-cover labels.
///
/// Class codes are looked up in the Dynamic World table; `"null"` becomes NA.
/// Counts must be non-negative whole numbers of pixels.
pub fn remap_histogram(raw: &RawHistogram) -> Result<PixelCounts> {
    let mut counts = PixelCounts::new();

    for (key, count) in raw {
        let label = LandCover::from_histogram_key(key).ok_or_else(|| {
            DynamicWorldError::UnexpectedResponse(format!("unknown class code {:?}", key))
        })?;

        if !count.is_finite() || *count < 0.0 {
            return Err(DynamicWorldError::UnexpectedResponse(format!(
                "invalid pixel count {} for class {}",
                count, key
            )));
        }
        if count.fract() != 0.0 {
            warn!(class = %key, count, "Rounding fractional pixel count");
        }

        *counts.entry(label).or_insert(0) += count.round() as u64;
    }

    Ok(counts)
}

/// Count the pixels of each land-cover class in `forest` between `start_date`
/// (inclusive) and `end_date` (exclusive).
///
/// Each pixel takes the most frequent label among the images of the window.
/// Dates must be `YYYY-MM-DD` with `start_date < end_date`; an `end_date`
/// before the project start only logs a warning.
pub async fn single_date_calculation<S>(
    service: &S,
    start_date: &str,
    end_date: &str,
    forest: &ForestConfig,
) -> Result<PixelCounts>
where
    S: ClassificationService + ?Sized,
{
    let (range, area) = prepare_query(start_date, end_date, forest)?;

    let raw = service.frequency_histogram(&range, &area).await?;
    let counts = remap_histogram(&raw)?;

    info!(
        forest = %forest.name(),
        start_date = %range.start_str(),
        end_date = %range.end_str(),
        pixels = counts.values().sum::<u64>(),
        "Calculated land-cover histogram"
    );

    Ok(counts)
}
