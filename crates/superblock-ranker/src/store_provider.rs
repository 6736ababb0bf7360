//! Trait for feature store access.
//!
//! Decouples the batch run from the file formats in `superblock-db`: the
//! run loads everything, computes the score table in memory and hands the
//! finished table to the store in one write.

use anyhow::Context;
use serde::Serialize;
use superblock_common::{BuildingRecord, CandidateFeature, ScoredFeature, ScoringConfig};
use superblock_db::{BuildingFieldMapping, FeatureStore, FieldMapping};
use tracing::info;

use crate::building_use::{aggregate_by_parcel, apply_building_sums, BuildingSummary};
use crate::scorer::{score_candidates, ScoreTable};

/// Source of candidate blocks (and optionally buildings) plus the sink for
/// the finished score table.
///
/// Implementations can use:
/// - CSV / GeoJSON files on disk
/// - In-memory tables (testing)
pub trait FeatureStoreProvider {
    fn load_candidates(&self) -> anyhow::Result<Vec<CandidateFeature>>;

    /// Building records used to derive the per-parcel sums.
    /// `None` when candidates already carry their building sum.
    fn load_buildings(&self) -> anyhow::Result<Option<Vec<BuildingRecord>>>;

    /// Persist the complete table. Called at most once per run.
    fn write_scores(&mut self, features: &[ScoredFeature]) -> anyhow::Result<usize>;
}

// ── In-memory implementation for testing ─────────────────────────────────────

/// In-memory store. Records what was written.
#[derive(Debug, Default)]
pub struct InMemoryFeatureStore {
    candidates: Vec<CandidateFeature>,
    buildings: Option<Vec<BuildingRecord>>,
    written: Option<Vec<ScoredFeature>>,
    write_calls: usize,
}

impl InMemoryFeatureStore {
    pub fn new(candidates: Vec<CandidateFeature>) -> Self {
        Self {
            candidates,
            ..Default::default()
        }
    }

    pub fn with_buildings(mut self, buildings: Vec<BuildingRecord>) -> Self {
        self.buildings = Some(buildings);
        self
    }

    pub fn written(&self) -> Option<&[ScoredFeature]> {
        self.written.as_deref()
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls
    }
}

impl FeatureStoreProvider for InMemoryFeatureStore {
    fn load_candidates(&self) -> anyhow::Result<Vec<CandidateFeature>> {
        Ok(self.candidates.clone())
    }

    fn load_buildings(&self) -> anyhow::Result<Option<Vec<BuildingRecord>>> {
        Ok(self.buildings.clone())
    }

    fn write_scores(&mut self, features: &[ScoredFeature]) -> anyhow::Result<usize> {
        self.write_calls += 1;
        self.written = Some(features.to_vec());
        Ok(features.len())
    }
}

// ── File-backed adapter ──────────────────────────────────────────────────────

/// Adapter over `superblock_db::FeatureStore` datasets.
pub struct FileStoreAdapter {
    input: FeatureStore,
    output: FeatureStore,
    buildings: Option<FeatureStore>,
    fields: FieldMapping,
    building_fields: BuildingFieldMapping,
}

impl FileStoreAdapter {
    pub fn new(input: FeatureStore, output: FeatureStore) -> Self {
        Self {
            input,
            output,
            buildings: None,
            fields: FieldMapping::default(),
            building_fields: BuildingFieldMapping::default(),
        }
    }

    pub fn with_buildings(mut self, buildings: FeatureStore) -> Self {
        self.buildings = Some(buildings);
        self
    }

    pub fn with_fields(mut self, fields: FieldMapping, building_fields: BuildingFieldMapping) -> Self {
        self.fields = fields;
        self.building_fields = building_fields;
        self
    }
}

impl FeatureStoreProvider for FileStoreAdapter {
    fn load_candidates(&self) -> anyhow::Result<Vec<CandidateFeature>> {
        let path = self.input.path().display().to_string();
        // The building sum column is derived when a building dataset is given.
        let candidates = if self.buildings.is_some() {
            self.input.read_candidate_shapes(&self.fields)
        } else {
            self.input.read_candidates(&self.fields)
        };
        candidates.with_context(|| format!("Failed to read candidate blocks from {path}"))
    }

    fn load_buildings(&self) -> anyhow::Result<Option<Vec<BuildingRecord>>> {
        let Some(store) = &self.buildings else {
            return Ok(None);
        };
        let records = store
            .read_buildings(&self.building_fields)
            .with_context(|| format!("Failed to read buildings from {}", store.path().display()))?;
        Ok(Some(records))
    }

    fn write_scores(&mut self, features: &[ScoredFeature]) -> anyhow::Result<usize> {
        self.output
            .write_scored(features)
            .with_context(|| format!("Failed to write scores to {}", self.output.path().display()))
    }
}

// ── Batch run ────────────────────────────────────────────────────────────────

/// Everything one batch run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub table: ScoreTable,
    pub buildings: Option<BuildingSummary>,
    pub written: usize,
}

/// Load, compute, then persist in one write. Any error before the write
/// leaves the store untouched.
pub fn run_batch<S: FeatureStoreProvider>(store: &mut S, config: &ScoringConfig) -> anyhow::Result<BatchOutcome> {
    let mut candidates = store.load_candidates()?;
    info!(count = candidates.len(), "Candidates loaded");

    let buildings = match store.load_buildings()? {
        Some(records) => {
            let summary = aggregate_by_parcel(&records, config.existing_building_status);
            apply_building_sums(&mut candidates, &summary.sums());
            Some(summary)
        }
        None => None,
    };

    let table = score_candidates(&candidates, config).context("Scoring failed")?;
    let written = store.write_scores(&table.features)?;
    info!(written, "Score table persisted");

    Ok(BatchOutcome {
        table,
        buildings,
        written,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
