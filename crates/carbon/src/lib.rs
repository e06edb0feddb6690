//! CO2 estimation from land-cover pixel counts.
//!
//! Each pixel carries a weight depending on its class (forest >> built, for
//! example); the total is the weighted pixel count divided by
//! `factor_pixel`. Pixels must represent 10m x 10m cells.
//!
//! NA pixels are assumed to follow the distribution of the classified ones:
//! if 40% of the classified pixels are trees, 40% of the NA pixels are
//! counted as trees too.

use forest_config::ForestConfig;
use mrv_common::{Co2Factors, LandCover, MrvError, MrvResult, PixelCounts};
use tracing::debug;

/// Tons of CO2 retained by an area with the given land-cover distribution.
///
/// Labels with a configured coefficient use it; every other classified label
/// uses the `other` coefficient. A missing NA entry counts as zero NA pixels.
///
/// An empty histogram yields `0.0`. NA pixels without any classified pixel
/// to distribute them over are an error.
pub fn co2_factor_calculation(pixel_counts: &PixelCounts, factors: &Co2Factors) -> MrvResult<f64> {
    let na_count = pixel_counts.get(&LandCover::Na).copied().unwrap_or(0);
    let not_na_count: u64 = pixel_counts
        .iter()
        .filter(|(label, _)| label.is_classified())
        .map(|(_, count)| *count)
        .sum();

    if not_na_count == 0 {
        if na_count > 0 {
            return Err(MrvError::NoClassifiedPixels { na: na_count });
        }
        return Ok(0.0);
    }

    let factor_pixel = factors.factor_pixel();
    let mut total_co2 = 0.0;

    for (label, count) in pixel_counts.iter().filter(|(label, _)| label.is_classified()) {
        let count = *count as f64;
        let redistributed = count + na_count as f64 * count / not_na_count as f64;
        let weight = factors.weight(*label).unwrap_or_else(|| factors.other());
        total_co2 += redistributed * weight / factor_pixel;
    }

    debug!(
        na = na_count,
        classified = not_na_count,
        co2_tons = total_co2,
        "Calculated CO2 factor"
    );

    Ok(total_co2)
}

/// [`co2_factor_calculation`] with the coefficients of `forest`.
pub fn forest_co2_tons(pixel_counts: &PixelCounts, forest: &ForestConfig) -> MrvResult<f64> {
    co2_factor_calculation(pixel_counts, forest.co2_factor_info())
}
