use thiserror::Error;

use crate::entities::FeatureId;

/// Failures of the scoring core.
///
/// `ValueConversion`, `DivisionByZero` and `NegativeDimension` are
/// per-feature problems: the scorer records them and keeps going.
/// Everything else aborts the pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("No valid values in field '{field}' to compute quantile breakpoints from")]
    EmptyInput { field: String },

    #[error("Invalid weighting {geb}/{verh}: weights must be non-negative and sum to 100")]
    InvalidWeight { geb: i32, verh: i32 },

    #[error("Unknown weighting preset {0} (expected 0..=6)")]
    InvalidPreset(usize),

    #[error("Cannot compute width/height ratio: height is zero (width {width})")]
    DivisionByZero { width: f64 },

    #[error("Negative bounding box {width} x {height}")]
    NegativeDimension { width: f64, height: f64 },

    #[error("Feature {id}: value '{value}' in field '{field}' is not numeric")]
    ValueConversion {
        id: FeatureId,
        field: String,
        value: String,
    },

    #[error("Field '{field}' not found. Available fields: {available}")]
    MissingField { field: String, available: String },

    #[error("Duplicate feature id: {0}")]
    DuplicateId(FeatureId),

    #[error("Invalid ratio thresholds: {0}")]
    InvalidThresholds(String),
}

#[derive(Debug, Error)]
pub enum SuperblockError {
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SuperblockError>;
