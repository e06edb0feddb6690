//! Per-label CO2 coefficients.

use std::collections::BTreeMap;

use crate::error::{MrvError, MrvResult};
use crate::labels::LandCover;

/// Reserved key holding the weight for labels without their own coefficient.
pub const OTHER_LABEL: &str = "other";
/// Reserved key holding the divisor that converts pixel counts to the weight basis.
pub const FACTOR_PIXEL_LABEL: &str = "factor_pixel";

const CO2_FACTOR: &str = "co2_factor";

/// Validated CO2 coefficient mapping.
///
/// Always carries `other` and `factor_pixel`; every remaining key is a
/// classified land-cover label.
#[derive(Debug, Clone, PartialEq)]
pub struct Co2Factors {
    weights: BTreeMap<LandCover, f64>,
    other: f64,
    factor_pixel: f64,
}

impl Co2Factors {
    /// Validate a raw `key -> number` mapping.
    pub fn from_map(map: &BTreeMap<String, f64>) -> MrvResult<Self> {
        let other = *map.get(OTHER_LABEL).ok_or(MrvError::KeyNotPresent {
            label: CO2_FACTOR,
            key: OTHER_LABEL,
        })?;
        let factor_pixel = *map.get(FACTOR_PIXEL_LABEL).ok_or(MrvError::KeyNotPresent {
            label: CO2_FACTOR,
            key: FACTOR_PIXEL_LABEL,
        })?;

        let mut weights = BTreeMap::new();
        for (key, value) in map {
            if key == OTHER_LABEL || key == FACTOR_PIXEL_LABEL {
                continue;
            }
            let label = key
                .parse::<LandCover>()
                .ok()
                .filter(LandCover::is_classified)
                .ok_or_else(|| MrvError::UndefinedKey {
                    key: key.clone(),
                    valid: LandCover::classified_names(),
                })?;
            weights.insert(label, *value);
        }

        for (key, value) in map {
            if !value.is_finite() {
                return Err(MrvError::InvalidCoefficient {
                    key: key.clone(),
                    value: *value,
                    requirement: "a finite number",
                });
            }
        }
        if factor_pixel <= 0.0 {
            return Err(MrvError::InvalidCoefficient {
                key: FACTOR_PIXEL_LABEL.to_string(),
                value: factor_pixel,
                requirement: "greater than zero",
            });
        }

        Ok(Self {
            weights,
            other,
            factor_pixel,
        })
    }

    /// Coefficient explicitly configured for `label`, if any.
    pub fn weight(&self, label: LandCover) -> Option<f64> {
        self.weights.get(&label).copied()
    }

    pub fn weights(&self) -> &BTreeMap<LandCover, f64> {
        &self.weights
    }

    pub fn other(&self) -> f64 {
        self.other
    }

    pub fn factor_pixel(&self) -> f64 {
        self.factor_pixel
    }

    /// The mapping in its on-disk shape, reserved keys included.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map: BTreeMap<String, f64> = self
            .weights
            .iter()
            .map(|(label, weight)| (label.as_str().to_string(), *weight))
            .collect();
        map.insert(OTHER_LABEL.to_string(), self.other);
        map.insert(FACTOR_PIXEL_LABEL.to_string(), self.factor_pixel);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_valid_factors() {
        let factors = Co2Factors::from_map(&map(&[
            ("trees", 591.85),
            ("crops", 11.5),
            ("other", 0.0),
            ("factor_pixel", 100.0),
        ]))
        .unwrap();

        assert_eq!(factors.weight(LandCover::Trees), Some(591.85));
        assert_eq!(factors.weight(LandCover::Water), None);
        assert_eq!(factors.other(), 0.0);
        assert_eq!(factors.factor_pixel(), 100.0);
    }

    #[test]
    fn test_missing_other() {
        let err = Co2Factors::from_map(&map(&[("trees", 1.0), ("factor_pixel", 100.0)])).unwrap_err();
        assert!(matches!(err, MrvError::KeyNotPresent { key: "other", .. }));
        assert_eq!(err.to_string(), "co2_factor must contain a key named other");
    }

    #[test]
    fn test_missing_factor_pixel() {
        let err = Co2Factors::from_map(&map(&[("trees", 1.0), ("other", 0.0)])).unwrap_err();
        assert!(matches!(err, MrvError::KeyNotPresent { key: "factor_pixel", .. }));
    }

    #[test]
    fn test_only_reserved_keys_is_valid() {
        let factors = Co2Factors::from_map(&map(&[("other", 1.0), ("factor_pixel", 100.0)])).unwrap();
        assert!(factors.weights().is_empty());
    }

    #[test]
    fn test_undefined_key_names_offender() {
        let err = Co2Factors::from_map(&map(&[
            ("forest", 1.0),
            ("other", 0.0),
            ("factor_pixel", 100.0),
        ]))
        .unwrap_err();

        match &err {
            MrvError::UndefinedKey { key, valid } => {
                assert_eq!(key, "forest");
                assert_eq!(valid.len(), 9);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("forest is not one of"));
    }

    #[test]
    fn test_na_is_not_a_coefficient_key() {
        let err = Co2Factors::from_map(&map(&[("NA", 1.0), ("other", 0.0), ("factor_pixel", 100.0)]))
            .unwrap_err();
        assert!(matches!(err, MrvError::UndefinedKey { .. }));
    }

    #[test]
    fn test_factor_pixel_must_be_positive() {
        let err = Co2Factors::from_map(&map(&[("other", 0.0), ("factor_pixel", 0.0)])).unwrap_err();
        assert!(matches!(err, MrvError::InvalidCoefficient { .. }));
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let err = Co2Factors::from_map(&map(&[
            ("trees", f64::NAN),
            ("other", 0.0),
            ("factor_pixel", 100.0),
        ]))
        .unwrap_err();
        assert!(err.is_invalid_value());
    }

    #[test]
    fn test_to_map_round_trip() {
        let source = map(&[
            ("trees", 591.85),
            ("grass", 6.0),
            ("other", 0.0),
            ("factor_pixel", 100.0),
        ]);
        let factors = Co2Factors::from_map(&source).unwrap();
        assert_eq!(factors.to_map(), source);
    }
}
