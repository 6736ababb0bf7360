//! Block shape score from the oriented bounding box.
//! Compact (near-square) blocks score high, elongated ones low.

use superblock_common::{RatioThresholds, ScoringError};

/// `100 * width / height`. Fails for a zero height and for negative sides.
pub fn ratio_percent(width: f64, height: f64) -> Result<f64, ScoringError> {
    if width < 0.0 || height < 0.0 {
        return Err(ScoringError::NegativeDimension { width, height });
    }
    if height == 0.0 {
        return Err(ScoringError::DivisionByZero { width });
    }
    Ok(100.0 * width / height)
}

/// Band of a ratio percentage on the given ladder.
pub fn band_for_percent(percent: f64, thresholds: &RatioThresholds) -> i32 {
    thresholds
        .bands
        .iter()
        .find(|band| percent >= band.min_percent)
        .map(|band| band.score)
        .unwrap_or(thresholds.floor_score)
}

/// Ratio score of a bounding box.
///
/// A zero width or an infinite height gives a 0 % ratio and the floor score.
/// A zero height or a negative side is an error.
pub fn classify_ratio(width: f64, height: f64, thresholds: &RatioThresholds) -> Result<i32, ScoringError> {
    let percent = ratio_percent(width, height)?;
    Ok(band_for_percent(percent, thresholds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(width: f64, height: f64) -> i32 {
        classify_ratio(width, height, &RatioThresholds::default()).unwrap()
    }

    #[test]
    fn test_reference_ratios() {
        assert_eq!(score(100.0, 100.0), 3);
        assert_eq!(score(50.0, 100.0), 0);
        assert_eq!(score(10.0, 100.0), -3);
    }

    #[test]
    fn test_lower_bounds_are_inclusive() {
        let t = RatioThresholds::default();
        assert_eq!(band_for_percent(85.7, &t), 3);
        assert_eq!(band_for_percent(85.69, &t), 2);
        assert_eq!(band_for_percent(71.4, &t), 2);
        assert_eq!(band_for_percent(57.1, &t), 1);
        assert_eq!(band_for_percent(42.8, &t), 0);
        assert_eq!(band_for_percent(28.5, &t), -1);
        assert_eq!(band_for_percent(14.2, &t), -2);
        assert_eq!(band_for_percent(14.19, &t), -3);
    }

    #[test]
    fn test_width_longer_than_height_is_top_band() {
        assert_eq!(score(300.0, 100.0), 3);
    }

    #[test]
    fn test_zero_width_is_not_an_error() {
        assert_eq!(score(0.0, 80.0), -3);
        assert_eq!(score(25.0, f64::INFINITY), -3);
    }

    #[test]
    fn test_zero_height_is_an_error() {
        let err = classify_ratio(12.0, 0.0, &RatioThresholds::default()).unwrap_err();
        assert_eq!(err, ScoringError::DivisionByZero { width: 12.0 });
        assert!(ratio_percent(0.0, 0.0).is_err());
    }

    #[test]
    fn test_negative_sides_are_errors() {
        let t = RatioThresholds::default();
        assert_eq!(
            classify_ratio(-10.0, 100.0, &t),
            Err(ScoringError::NegativeDimension { width: -10.0, height: 100.0 })
        );
        assert_eq!(
            classify_ratio(10.0, -100.0, &t),
            Err(ScoringError::NegativeDimension { width: 10.0, height: -100.0 })
        );
        // -0.0 is not negative
        assert_eq!(classify_ratio(-0.0, 50.0, &t), Ok(-3));
    }
}
