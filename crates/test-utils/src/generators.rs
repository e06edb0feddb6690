//! Generators for pixel histograms.

use mrv_common::{LandCover, PixelCounts};

/// Every label, NA included, with the same `count`.
pub fn uniform_counts(count: u64) -> PixelCounts {
    LandCover::CLASSIFIED
        .iter()
        .copied()
        .chain(std::iter::once(LandCover::Na))
        .map(|label| (label, count))
        .collect()
}

/// Every classified label with the same `count` and no NA entry.
pub fn uniform_counts_without_na(count: u64) -> PixelCounts {
    LandCover::CLASSIFIED.iter().map(|label| (*label, count)).collect()
}

/// Build counts from `(label, count)` pairs, e.g. `counts(&[("trees", 40), ("NA", 2)])`.
///
/// Panics on an unknown label name.
pub fn counts(pairs: &[(&str, u64)]) -> PixelCounts {
    pairs
        .iter()
        .map(|(name, count)| {
            let label = name
                .parse::<LandCover>()
                .unwrap_or_else(|_| panic!("unknown label {name}"));
            (label, *count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_counts() {
        assert_eq!(uniform_counts(1).len(), 10);
        assert_eq!(uniform_counts_without_na(1).len(), 9);
        assert!(!uniform_counts_without_na(1).contains_key(&LandCover::Na));
    }

    #[test]
    fn test_counts() {
        let c = counts(&[("trees", 40), ("NA", 2)]);
        assert_eq!(c[&LandCover::Trees], 40);
        assert_eq!(c[&LandCover::Na], 2);
    }
}
