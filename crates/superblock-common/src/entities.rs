/// Core entity types flowing between the feature stores and the scorer.
/// Geometry is opaque here: upstream GIS preparation has already reduced each
/// candidate polygon to the numeric attributes the scorer needs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric identifier of a feature within one run.
pub type FeatureId = i64;

// ---------------------------------------------------------------------------
// Raw attribute values
// ---------------------------------------------------------------------------

/// A raw attribute cell as read from a feature store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum AttributeValue {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl AttributeValue {
    /// Interpret a text cell (CSV). Empty cells are null.
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            AttributeValue::Null
        } else {
            AttributeValue::Text(raw.to_string())
        }
    }

    /// Interpret a JSON property value (GeoJSON).
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Integer(i),
                None => n.as_f64().map(AttributeValue::Real).unwrap_or(AttributeValue::Null),
            },
            serde_json::Value::String(s) => AttributeValue::from_text(s),
            other => AttributeValue::Text(other.to_string()),
        }
    }

    /// Convert to a finite real number.
    ///
    /// `Ok(None)` for null or blank values (no score, no warning).
    /// `Err` carries the rendered value when it is present but not numeric;
    /// `NaN` and infinities count as not numeric.
    pub fn to_real(&self) -> Result<Option<f64>, String> {
        let v = match self {
            AttributeValue::Null => return Ok(None),
            AttributeValue::Integer(i) => *i as f64,
            AttributeValue::Real(r) => *r,
            AttributeValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed.parse::<f64>().map_err(|_| s.clone())?
            }
        };
        if v.is_finite() {
            Ok(Some(v))
        } else {
            Err(self.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "NULL"),
            AttributeValue::Integer(i) => write!(f, "{i}"),
            AttributeValue::Real(r) => write!(f, "{r}"),
            AttributeValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Real(v)
    }
}

impl From<Option<i64>> for AttributeValue {
    fn from(v: Option<i64>) -> Self {
        v.map(AttributeValue::Integer).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Candidate block / parcel
// ---------------------------------------------------------------------------

/// One candidate block polygon before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFeature {
    pub id: FeatureId,
    /// Sum of building-use scores of the buildings inside the polygon.
    pub building_score_sum: AttributeValue,
    /// Oriented minimum bounding box width.
    pub width: Option<f64>,
    /// Oriented minimum bounding box height.
    pub height: Option<f64>,
    /// Passed through untouched to GeoJSON outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
}

impl CandidateFeature {
    pub fn new(id: FeatureId, building_score_sum: impl Into<AttributeValue>) -> Self {
        Self {
            id,
            building_score_sum: building_score_sum.into(),
            width: None,
            height: None,
            geometry: None,
        }
    }

    pub fn with_bbox(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

// ---------------------------------------------------------------------------
// Building record
// ---------------------------------------------------------------------------

/// A building as delivered by the federal register (GWR) or the cantonal
/// building inventory. Which code fields are populated depends on the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    /// Parcel containing the building (result of the upstream spatial join).
    pub parcel_id: Option<FeatureId>,
    /// GWR building class.
    pub gklas: Option<i64>,
    /// GWR building status.
    pub gstat: Option<i64>,
    /// Cantonal building category.
    pub gebkatego: Option<i64>,
    /// Cantonal building status.
    pub gebstatus: Option<i64>,
}

// ---------------------------------------------------------------------------
// Scored output
// ---------------------------------------------------------------------------

/// A candidate with its three derived score fields attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFeature {
    pub id: FeatureId,
    pub score_gebaeude_sum: Option<f64>,
    /// Quantile band of `score_gebaeude_sum`, -3..=3.
    pub score_geb_sum_norm: Option<i32>,
    /// Width/height ratio band, -3..=3.
    pub score_verhaeltnis: Option<i32>,
    pub final_score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
}
