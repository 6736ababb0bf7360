//! Feature store error types.

use superblock_common::ScoringError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("CSV error: {0}")]
    Csv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Unsupported dataset format: {0} (expected .csv, .geojson or .json)")]
    UnsupportedFormat(String),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("Invalid record {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },
}

impl From<csv::Error> for DbError {
    fn from(err: csv::Error) -> Self {
        DbError::Csv(err.to_string())
    }
}

impl From<tempfile::PersistError> for DbError {
    fn from(err: tempfile::PersistError) -> Self {
        DbError::Io(err.error)
    }
}
