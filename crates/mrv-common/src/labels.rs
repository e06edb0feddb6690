//! Dynamic World land-cover labels.
//!
//! See <https://developers.google.com/earth-engine/datasets/catalog/GOOGLE_DYNAMICWORLD_V1>
//! for the class code reference.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pixel counts per land-cover label. Absent labels mean zero pixels.
pub type PixelCounts = BTreeMap<LandCover, u64>;

/// A land-cover class, plus `Na` for pixels without a confident classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandCover {
    Water,
    Trees,
    Grass,
    FloodedVegetation,
    Crops,
    ShrubAndScrub,
    Built,
    Bare,
    SnowAndIce,
    #[serde(rename = "NA")]
    Na,
}

impl LandCover {
    /// The nine classified labels, indexed by their Dynamic World class code.
    pub const CLASSIFIED: [LandCover; 9] = [
        LandCover::Water,
        LandCover::Trees,
        LandCover::Grass,
        LandCover::FloodedVegetation,
        LandCover::Crops,
        LandCover::ShrubAndScrub,
        LandCover::Built,
        LandCover::Bare,
        LandCover::SnowAndIce,
    ];

    /// Histogram key used by the service for pixels with no mode.
    pub const NULL_CODE: &'static str = "null";

    pub fn as_str(&self) -> &'static str {
        match self {
            LandCover::Water => "water",
            LandCover::Trees => "trees",
            LandCover::Grass => "grass",
            LandCover::FloodedVegetation => "flooded_vegetation",
            LandCover::Crops => "crops",
            LandCover::ShrubAndScrub => "shrub_and_scrub",
            LandCover::Built => "built",
            LandCover::Bare => "bare",
            LandCover::SnowAndIce => "snow_and_ice",
            LandCover::Na => "NA",
        }
    }

    /// Label for a numeric Dynamic World class code (0-8).
    pub fn from_class_code(code: u8) -> Option<Self> {
        Self::CLASSIFIED.get(code as usize).copied()
    }

    /// Label for a histogram key as returned by the service.
    ///
    /// Accepts `"null"` and integral codes, including float renderings such as `"4.0"`.
    pub fn from_histogram_key(key: &str) -> Option<Self> {
        let key = key.trim();
        if key == Self::NULL_CODE {
            return Some(LandCover::Na);
        }
        if let Ok(code) = key.parse::<u8>() {
            return Self::from_class_code(code);
        }
        match key.parse::<f64>() {
            Ok(value) if value.fract() == 0.0 && (0.0..=8.0).contains(&value) => {
                Self::from_class_code(value as u8)
            }
            _ => None,
        }
    }

    /// Names of the classified labels, as accepted in CO2 factor files.
    pub fn classified_names() -> Vec<&'static str> {
        Self::CLASSIFIED.iter().map(|l| l.as_str()).collect()
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self, LandCover::Na)
    }
}

impl fmt::Display for LandCover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown land-cover label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for LandCover {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == LandCover::Na.as_str() {
            return Ok(LandCover::Na);
        }
        LandCover::CLASSIFIED
            .iter()
            .find(|label| label.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}
