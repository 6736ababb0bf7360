//! Field layout of the stores the scorer reads from and writes to.
//!
//! Input column names are configurable because upstream GIS exports name
//! things differently; the output layout is fixed.

use serde::{Deserialize, Serialize};
use superblock_common::{FeatureId, ScoredFeature};

// =============================================================================
// Output fields
// =============================================================================

pub const FIELD_ID: &str = "fid";
pub const FIELD_BUILDING_SUM: &str = "score_gebaeude_sum";
pub const FIELD_BUILDING_NORM: &str = "score_geb_sum_norm";
pub const FIELD_RATIO: &str = "score_verhaeltnis";
pub const FIELD_FINAL: &str = "final_score";

/// Columns retained in the final output, in order.
pub const OUTPUT_FIELDS: [&str; 5] = [
    FIELD_ID,
    FIELD_BUILDING_SUM,
    FIELD_BUILDING_NORM,
    FIELD_RATIO,
    FIELD_FINAL,
];

/// Flat output row for tabular stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub fid: FeatureId,
    pub score_gebaeude_sum: Option<f64>,
    pub score_geb_sum_norm: Option<i32>,
    pub score_verhaeltnis: Option<i32>,
    pub final_score: Option<i32>,
}

impl From<&ScoredFeature> for ScoreRow {
    fn from(f: &ScoredFeature) -> Self {
        Self {
            fid: f.id,
            score_gebaeude_sum: f.score_gebaeude_sum,
            score_geb_sum_norm: f.score_geb_sum_norm,
            score_verhaeltnis: f.score_verhaeltnis,
            final_score: f.final_score,
        }
    }
}

/// Per-parcel building score sum, written as an intermediate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSumRow {
    pub parcel_id: FeatureId,
    pub score_gebaeude_sum: Option<i64>,
    pub building_count: usize,
}

// =============================================================================
// Input field mappings
// =============================================================================

/// Column names of the candidate block dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default = "default_id_field")]
    pub id: String,
    #[serde(default = "default_building_sum_field")]
    pub building_score_sum: String,
    #[serde(default = "default_width_field")]
    pub width: String,
    #[serde(default = "default_height_field")]
    pub height: String,
}

fn default_id_field() -> String { FIELD_ID.to_string() }
fn default_building_sum_field() -> String { FIELD_BUILDING_SUM.to_string() }
fn default_width_field() -> String { "width".to_string() }
fn default_height_field() -> String { "height".to_string() }

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            id: default_id_field(),
            building_score_sum: default_building_sum_field(),
            width: default_width_field(),
            height: default_height_field(),
        }
    }
}

/// Column names of the building dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingFieldMapping {
    #[serde(default = "default_parcel_field")]
    pub parcel_id: String,
    #[serde(default = "default_gklas_field")]
    pub gklas: String,
    #[serde(default = "default_gstat_field")]
    pub gstat: String,
    #[serde(default = "default_gebkatego_field")]
    pub gebkatego: String,
    #[serde(default = "default_gebstatus_field")]
    pub gebstatus: String,
}

fn default_parcel_field() -> String { "parcel_id".to_string() }
fn default_gklas_field() -> String { "GKLAS".to_string() }
fn default_gstat_field() -> String { "GSTAT".to_string() }
fn default_gebkatego_field() -> String { "GEBKATEGO".to_string() }
fn default_gebstatus_field() -> String { "GEBSTATUS".to_string() }

impl Default for BuildingFieldMapping {
    fn default() -> Self {
        Self {
            parcel_id: default_parcel_field(),
            gklas: default_gklas_field(),
            gstat: default_gstat_field(),
            gebkatego: default_gebkatego_field(),
            gebstatus: default_gebstatus_field(),
        }
    }
}
