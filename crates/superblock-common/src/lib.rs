//! superblock-common — Shared types, errors, and configuration used across all superblock crates.

pub mod error;
pub mod entities;
pub mod scoring_config;

// Re-export commonly used types
pub use entities::{AttributeValue, BuildingRecord, CandidateFeature, FeatureId, ScoredFeature};
pub use error::{Result, ScoringError, SuperblockError};
pub use scoring_config::{RatioBand, RatioThresholds, ScoringConfig};
