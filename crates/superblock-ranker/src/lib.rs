//! superblock-ranker — candidate block scoring engine.
//!
//! Quantile banding of the building-use sum, bounding-box ratio banding
//! and their weighted composite, plus the batch run over a feature store.

pub mod building_use;
pub mod quantile;
pub mod ratio;
pub mod scorer;
pub mod store_provider;
pub mod weights;

pub use building_use::{aggregate_by_parcel, apply_building_sums, BuildingSource, BuildingSummary};
pub use quantile::{band_histogram, classify_field, Breakpoints, QuantileOutcome};
pub use ratio::classify_ratio;
pub use scorer::{score_candidates, ScoreReport, ScoreTable};
pub use store_provider::{run_batch, BatchOutcome, FeatureStoreProvider, FileStoreAdapter, InMemoryFeatureStore};
pub use weights::Weighting;
