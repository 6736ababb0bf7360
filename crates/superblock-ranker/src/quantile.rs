//! Quantile banding of a numeric field.
//!
//! Six breakpoints are drawn from the sorted sample at positions
//! floor(n·k/7), k = 1..6, and every value is mapped onto the symmetric
//! band ladder -3..=3 with inclusive upper bounds. Breakpoints are sample
//! values, never interpolated, so duplicates can leave bands empty.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use superblock_common::{AttributeValue, FeatureId, ScoringError};
use tracing::{info, warn};

/// Number of score bands (-3..=3).
pub const BAND_COUNT: usize = 7;

/// Breakpoints separating the bands.
pub const BREAKPOINT_COUNT: usize = BAND_COUNT - 1;

/// Ascending breakpoints b1..b6 of one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoints([f64; BREAKPOINT_COUNT]);

impl Breakpoints {
    /// Compute breakpoints from an unsorted sample.
    /// Returns `None` for an empty sample.
    pub fn from_sample(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mut points = [0.0; BREAKPOINT_COUNT];
        for (k, point) in points.iter_mut().enumerate() {
            // floor(n * (k+1) / 7) in exact integer arithmetic
            let idx = (n * (k + 1) / BAND_COUNT).min(n - 1);
            *point = sorted[idx];
        }
        Some(Self(points))
    }

    pub fn values(&self) -> &[f64; BREAKPOINT_COUNT] {
        &self.0
    }

    /// Band of `value`: the first breakpoint it does not exceed decides the
    /// band; only values strictly above b6 reach +3.
    pub fn score(&self, value: f64) -> i32 {
        self.0
            .iter()
            .position(|&b| value <= b)
            .map(|i| i as i32 - 3)
            .unwrap_or(3)
    }
}

/// Result of banding one field over a feature table.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileOutcome {
    pub field: String,
    pub breakpoints: Breakpoints,
    /// Band per feature with a valid source value.
    pub scores: BTreeMap<FeatureId, i32>,
    /// Features whose source value was null or blank.
    pub nulls: usize,
    /// One `ValueConversion` per feature whose value was not numeric.
    pub skipped: Vec<ScoringError>,
}

/// Band `field` across all features.
///
/// Null and blank values leave the feature unscored. Non-numeric values are
/// logged, left unscored and excluded from the breakpoint sample. Fails with
/// `EmptyInput` when no valid value remains.
pub fn classify_field<'a, I>(field: &str, values: I) -> Result<QuantileOutcome, ScoringError>
where
    I: IntoIterator<Item = (FeatureId, &'a AttributeValue)>,
{
    let mut parsed: Vec<(FeatureId, f64)> = Vec::new();
    let mut nulls = 0;
    let mut skipped = Vec::new();

    for (id, raw) in values {
        match raw.to_real() {
            Ok(Some(v)) => parsed.push((id, v)),
            Ok(None) => nulls += 1,
            Err(value) => {
                warn!(feature = id, field, value = %value, "Skipping non-numeric value");
                skipped.push(ScoringError::ValueConversion {
                    id,
                    field: field.to_string(),
                    value,
                });
            }
        }
    }

    let sample: Vec<f64> = parsed.iter().map(|&(_, v)| v).collect();
    let breakpoints = Breakpoints::from_sample(&sample).ok_or_else(|| ScoringError::EmptyInput {
        field: field.to_string(),
    })?;

    info!(field, valid = sample.len(), nulls, skipped = skipped.len(), "Quantile sample collected");
    for (k, b) in breakpoints.values().iter().enumerate() {
        info!("  q{}: {:.2}", k + 1, b);
    }

    // Breakpoints are fixed above; per-feature banding is read-only.
    let scores: BTreeMap<FeatureId, i32> = parsed
        .par_iter()
        .map(|&(id, v)| (id, breakpoints.score(v)))
        .collect();

    Ok(QuantileOutcome {
        field: field.to_string(),
        breakpoints,
        scores,
        nulls,
        skipped,
    })
}

/// Count of values per band, index 0 = band -3.
pub fn band_histogram(scores: impl IntoIterator<Item = i32>) -> [usize; BAND_COUNT] {
    let mut counts = [0; BAND_COUNT];
    for s in scores {
        if let Ok(i) = usize::try_from(s + 3) {
            if i < BAND_COUNT {
                counts[i] += 1;
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use superblock_test_utils::fixtures::{seeded_integer_sample, seeded_sample};

    fn values(raw: &[AttributeValue]) -> Vec<(FeatureId, &AttributeValue)> {
        raw.iter().enumerate().map(|(i, v)| (i as FeatureId + 1, v)).collect()
    }

    #[test]
    fn test_one_to_seven_breakpoints() {
        let b = Breakpoints::from_sample(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]).unwrap();
        assert_eq!(b.values(), &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(b.score(1.0), -3);
        assert_eq!(b.score(2.0), -3);
        assert_eq!(b.score(3.0), -2);
        // Tie with b6 stays in band 2.
        assert_eq!(b.score(7.0), 2);
        let scores: Vec<i32> = (1..=7).map(|v| b.score(v as f64)).collect();
        assert!(!scores.contains(&3), "nothing in the sample reaches +3: {scores:?}");
    }

    #[test]
    fn test_seven_identical_values() {
        let b = Breakpoints::from_sample(&[5.0; 7]).unwrap();
        assert_eq!(b.values(), &[5.0; 6]);
        // value <= b1 → -3 for the identical value itself
        assert_eq!(b.score(5.0), -3);
        assert_eq!(b.score(5.000001), 3);
        assert_eq!(b.score(4.0), -3);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let b = Breakpoints::from_sample(&[7.0, 3.0, 1.0, 6.0, 2.0, 5.0, 4.0]).unwrap();
        assert_eq!(b.values(), &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_single_value_sample() {
        let b = Breakpoints::from_sample(&[42.0]).unwrap();
        assert_eq!(b.values(), &[42.0; 6]);
        assert_eq!(b.score(42.0), -3);
        assert!(Breakpoints::from_sample(&[]).is_none());
    }

    #[test]
    fn test_index_is_floored() {
        // n = 10: indices floor(10k/7) = 1, 2, 4, 5, 7, 8
        let sample: Vec<f64> = (0..10).map(f64::from).collect();
        let b = Breakpoints::from_sample(&sample).unwrap();
        assert_eq!(b.values(), &[1.0, 2.0, 4.0, 5.0, 7.0, 8.0]);
    }

    #[test]
    fn test_every_value_gets_one_band_and_order_is_kept() {
        for seed in 0..20 {
            let sample = seeded_sample(seed, 1 + seed as usize * 13);
            let b = Breakpoints::from_sample(&sample).unwrap();
            assert!(b.values().windows(2).all(|w| w[0] <= w[1]));

            let mut sorted = sample.clone();
            sorted.sort_by(f64::total_cmp);
            let scores: Vec<i32> = sorted.iter().map(|&v| b.score(v)).collect();
            assert!(scores.iter().all(|s| (-3..=3).contains(s)));
            assert!(scores.windows(2).all(|w| w[0] <= w[1]), "seed {seed}: {scores:?}");
        }
    }

    #[test]
    fn test_duplicate_heavy_samples_stay_monotonic() {
        for seed in 0..10 {
            let sample: Vec<f64> = seeded_integer_sample(seed, 200).into_iter().map(|v| v as f64).collect();
            let b = Breakpoints::from_sample(&sample).unwrap();
            let hist = band_histogram(sample.iter().map(|&v| b.score(v)));
            assert_eq!(hist.iter().sum::<usize>(), sample.len());
        }
    }

    #[test]
    fn test_classify_field_skips_nulls_and_garbage() {
        let raw = vec![
            AttributeValue::Integer(1),
            AttributeValue::Null,
            AttributeValue::Text("abc".into()),
            AttributeValue::Text("7".into()),
            AttributeValue::Real(4.0),
            AttributeValue::Text("".into()),
        ];
        let outcome = classify_field("score_gebaeude_sum", values(&raw)).unwrap();

        assert_eq!(outcome.nulls, 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(
            outcome.skipped[0],
            ScoringError::ValueConversion {
                id: 3,
                field: "score_gebaeude_sum".into(),
                value: "abc".into()
            }
        );
        // Sample [1, 4, 7]: indices 0, 0, 1, 1, 2, 2
        assert_eq!(outcome.breakpoints.values(), &[1.0, 1.0, 4.0, 4.0, 7.0, 7.0]);
        assert_eq!(outcome.scores.len(), 3);
        assert_eq!(outcome.scores[&1], -3);
        assert_eq!(outcome.scores[&4], 1);
        assert_eq!(outcome.scores[&5], -1);
        assert!(!outcome.scores.contains_key(&2));
        assert!(!outcome.scores.contains_key(&3));
    }

    #[test]
    fn test_classify_field_empty_input() {
        let raw = vec![AttributeValue::Null, AttributeValue::Text("n/a".into())];
        let err = classify_field("score_gebaeude_sum", values(&raw)).unwrap_err();
        assert_eq!(err, ScoringError::EmptyInput { field: "score_gebaeude_sum".into() });
    }

    #[test]
    fn test_band_histogram() {
        assert_eq!(band_histogram([-3, -3, 0, 3, 2]), [2, 0, 0, 1, 0, 1, 1]);
    }
}
