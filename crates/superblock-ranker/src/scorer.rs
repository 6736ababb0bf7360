//! Composite block score computation.
//!
//! `score_candidates` is a pure function from candidate features to a score
//! table: building-use quantile band, shape band and their weighted
//! composite. Nothing is written here; persisting the table is the caller's
//! single batch step.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use superblock_common::{CandidateFeature, FeatureId, ScoredFeature, ScoringConfig, ScoringError};
use superblock_db::FIELD_BUILDING_SUM;
use tracing::{info, warn};

use crate::quantile::{band_histogram, classify_field, Breakpoints, BAND_COUNT};
use crate::ratio::classify_ratio;
use crate::weights::Weighting;

/// A source value that could not be read as a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedValue {
    pub id: FeatureId,
    pub field: String,
    pub value: String,
}

/// Counts and ids describing what a scoring pass did with each feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreReport {
    pub total: usize,
    /// Features that received a final score.
    pub scored: usize,
    /// Null or blank building sums.
    pub nulls: usize,
    pub skipped: Vec<SkippedValue>,
    /// Features with a zero bounding-box height or a negative side.
    pub degenerate: Vec<FeatureId>,
    /// Features without width or height.
    pub missing_bbox: usize,
    pub unscored_final: usize,
    /// Features per quantile band, index 0 = band -3.
    pub band_counts: [usize; BAND_COUNT],
}

/// Result of one scoring pass, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTable {
    pub features: Vec<ScoredFeature>,
    pub breakpoints: Breakpoints,
    pub weighting: Weighting,
    pub report: ScoreReport,
}

enum ShapeScore {
    Scored(i32),
    MissingBox,
    Degenerate(ScoringError),
}

/// Score every candidate.
///
/// Fails before any computation on an invalid weighting or ratio ladder,
/// on duplicate ids, and when no candidate has a numeric building sum.
/// Per-feature problems (null or non-numeric sums, missing or degenerate
/// boxes) leave that feature's affected scores unset and are counted in
/// the report.
pub fn score_candidates(candidates: &[CandidateFeature], config: &ScoringConfig) -> Result<ScoreTable, ScoringError> {
    let weighting = Weighting::try_from(config)?;
    config.validate()?;

    let mut seen = HashSet::with_capacity(candidates.len());
    if let Some(dup) = candidates.iter().find(|c| !seen.insert(c.id)) {
        return Err(ScoringError::DuplicateId(dup.id));
    }

    let quantile = classify_field(
        FIELD_BUILDING_SUM,
        candidates.iter().map(|c| (c.id, &c.building_score_sum)),
    )?;

    let shapes: Vec<ShapeScore> = candidates
        .par_iter()
        .map(|c| match (c.width, c.height) {
            (Some(w), Some(h)) if !w.is_nan() && !h.is_nan() => match classify_ratio(w, h, &config.ratio) {
                Ok(score) => ShapeScore::Scored(score),
                Err(e) => ShapeScore::Degenerate(e),
            },
            _ => ShapeScore::MissingBox,
        })
        .collect();

    let mut report = ScoreReport {
        total: candidates.len(),
        nulls: quantile.nulls,
        skipped: quantile
            .skipped
            .iter()
            .filter_map(|e| match e {
                ScoringError::ValueConversion { id, field, value } => Some(SkippedValue {
                    id: *id,
                    field: field.clone(),
                    value: value.clone(),
                }),
                _ => None,
            })
            .collect(),
        band_counts: band_histogram(quantile.scores.values().copied()),
        ..Default::default()
    };

    let mut features = Vec::with_capacity(candidates.len());
    for (candidate, shape) in candidates.iter().zip(shapes) {
        let building_norm = quantile.scores.get(&candidate.id).copied();
        let ratio = match shape {
            ShapeScore::Scored(s) => Some(s),
            ShapeScore::MissingBox => {
                report.missing_bbox += 1;
                None
            }
            ShapeScore::Degenerate(e) => {
                warn!(feature = candidate.id, "{e}, no ratio score");
                report.degenerate.push(candidate.id);
                None
            }
        };
        let final_score = match (building_norm, ratio) {
            (Some(g), Some(v)) => Some(weighting.composite(g, v)),
            _ => None,
        };
        if final_score.is_some() {
            report.scored += 1;
        } else {
            report.unscored_final += 1;
        }

        features.push(ScoredFeature {
            id: candidate.id,
            score_gebaeude_sum: candidate.building_score_sum.to_real().ok().flatten(),
            score_geb_sum_norm: building_norm,
            score_verhaeltnis: ratio,
            final_score,
            geometry: candidate.geometry.clone(),
        });
    }

    info!(
        total = report.total,
        scored = report.scored,
        nulls = report.nulls,
        skipped = report.skipped.len(),
        degenerate = report.degenerate.len(),
        missing_bbox = report.missing_bbox,
        %weighting,
        "Scoring complete"
    );

    Ok(ScoreTable {
        features,
        breakpoints: quantile.breakpoints,
        weighting,
        report,
    })
}
