//! Builders for candidate blocks, scored rows and on-disk datasets.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use superblock_common::{AttributeValue, BuildingRecord, CandidateFeature, FeatureId, ScoredFeature};

/// Candidate with a building-score sum and a bounding box.
pub fn candidate(
    id: FeatureId,
    building_score_sum: impl Into<AttributeValue>,
    width: f64,
    height: f64,
) -> CandidateFeature {
    CandidateFeature::new(id, building_score_sum).with_bbox(width, height)
}

/// Candidates 1..=n with integer sums taken from `sums` and a square bbox.
pub fn square_candidates(sums: &[i64]) -> Vec<CandidateFeature> {
    sums.iter()
        .enumerate()
        .map(|(i, &s)| candidate(i as FeatureId + 1, s, 40.0, 40.0))
        .collect()
}

pub fn scored(
    id: FeatureId,
    score_gebaeude_sum: Option<f64>,
    score_geb_sum_norm: Option<i32>,
    score_verhaeltnis: Option<i32>,
    final_score: Option<i32>,
) -> ScoredFeature {
    ScoredFeature {
        id,
        score_gebaeude_sum,
        score_geb_sum_norm,
        score_verhaeltnis,
        final_score,
        geometry: None,
    }
}

/// GWR building inside `parcel` with the "existing" status.
pub fn gwr_building(parcel: FeatureId, gklas: i64) -> BuildingRecord {
    BuildingRecord {
        parcel_id: Some(parcel),
        gklas: Some(gklas),
        gstat: Some(1004),
        ..Default::default()
    }
}

/// Cantonal building inside `parcel` with the "existing" status.
pub fn cantonal_building(parcel: FeatureId, gebkatego: i64) -> BuildingRecord {
    BuildingRecord {
        parcel_id: Some(parcel),
        gebkatego: Some(gebkatego),
        gebstatus: Some(1004),
        ..Default::default()
    }
}

/// Reproducible real-valued sample in [-50, 50).
pub fn seeded_sample(seed: u64, n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-50.0..50.0)).collect()
}

/// Reproducible integer sample with many duplicates, like building sums.
pub fn seeded_integer_sample(seed: u64, n: usize) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-6..=15)).collect()
}

/// Write `content` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture file");
    path
}

/// A candidate-block CSV with the default column names.
pub fn blocks_csv(rows: &[(FeatureId, &str, f64, f64)]) -> String {
    let mut out = String::from("fid,score_gebaeude_sum,width,height\n");
    for (id, sum, w, h) in rows {
        out.push_str(&format!("{id},{sum},{w},{h}\n"));
    }
    out
}
