//! Superblock feature store layer.
//!
//! File-backed datasets (CSV and GeoJSON) holding candidate blocks, building
//! records and the final score table.
//!
//! # Example
//!
//! ```rust,no_run
//! use superblock_db::{FeatureStore, FieldMapping};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = FeatureStore::open("./data/blocks.csv")?;
//!     let candidates = input.read_candidates(&FieldMapping::default())?;
//!     println!("{} candidate blocks", candidates.len());
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod schema;

pub use database::{FeatureStore, StoreFormat};
pub use error::{DbError, Result};
pub use schema::{
    BuildingFieldMapping, BuildingSumRow, FieldMapping, ScoreRow,
    FIELD_BUILDING_NORM, FIELD_BUILDING_SUM, FIELD_FINAL, FIELD_ID, FIELD_RATIO, OUTPUT_FIELDS,
};
