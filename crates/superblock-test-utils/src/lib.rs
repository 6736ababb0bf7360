//! Shared fixtures for superblock tests.

pub mod fixtures;

pub use pretty_assertions;
