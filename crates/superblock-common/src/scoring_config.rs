//! Immutable scoring configuration.
//!
//! Everything the scorer needs besides the feature table itself: the weight
//! split between the building score and the shape ratio score, the ratio
//! threshold ladder, and the status code marking existing buildings.
//! Loaded from YAML, JSON or TOML and passed by reference into the scorer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError, SuperblockError};

// ── Scoring Configuration ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Building score weight in percent (0–100)
    #[serde(default = "default_geb_weight")]
    pub geb_weight: i32,

    /// Ratio score weight in percent; `100 - geb_weight` when omitted
    #[serde(default)]
    pub verh_weight: Option<i32>,

    /// Width/height ratio ladder
    #[serde(default)]
    pub ratio: RatioThresholds,

    /// Status code of existing buildings (GWR `GSTAT` / cantonal `GEBSTATUS`)
    #[serde(default = "default_existing_status")]
    pub existing_building_status: i64,
}

fn default_geb_weight() -> i32 { 80 }
fn default_existing_status() -> i64 { 1004 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            geb_weight: default_geb_weight(),
            verh_weight: None,
            ratio: RatioThresholds::default(),
            existing_building_status: default_existing_status(),
        }
    }
}

impl ScoringConfig {
    /// The (building, ratio) percentage pair, with the ratio weight implied
    /// when it was not configured explicitly. An out-of-range `geb_weight`
    /// saturates instead of overflowing; validation rejects it later.
    pub fn weight_pair(&self) -> (i32, i32) {
        let verh = self
            .verh_weight
            .unwrap_or_else(|| 100i32.saturating_sub(self.geb_weight));
        (self.geb_weight, verh)
    }

    /// Structural checks that do not depend on the data.
    pub fn validate(&self) -> std::result::Result<(), ScoringError> {
        self.ratio.validate()
    }

    /// Load from a YAML, JSON or TOML file, chosen by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            Some("toml") => Self::from_toml(path),
            _ => Err(SuperblockError::Config(format!(
                "{}: expected a .yaml, .yml, .json or .toml scoring file",
                path.display()
            ))),
        }
    }

    /// Load from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to YAML file
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ── Ratio thresholds ──────────────────────────────────────────────────────────

/// One rung of the ratio ladder: `percent >= min_percent` scores `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBand {
    pub min_percent: f64,
    pub score: i32,
}

/// Descending ladder of inclusive lower bounds on `100 * width / height`.
/// Ratios below the last rung score `floor_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioThresholds {
    #[serde(default = "default_bands")]
    pub bands: Vec<RatioBand>,
    #[serde(default = "default_floor_score")]
    pub floor_score: i32,
}

fn default_bands() -> Vec<RatioBand> {
    [(85.7, 3), (71.4, 2), (57.1, 1), (42.8, 0), (28.5, -1), (14.2, -2)]
        .into_iter()
        .map(|(min_percent, score)| RatioBand { min_percent, score })
        .collect()
}

fn default_floor_score() -> i32 { -3 }

impl Default for RatioThresholds {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            floor_score: default_floor_score(),
        }
    }
}

impl RatioThresholds {
    /// Bounds must be finite and strictly descending; scores within [-3, 3].
    pub fn validate(&self) -> std::result::Result<(), ScoringError> {
        if self.bands.is_empty() {
            return Err(ScoringError::InvalidThresholds("ladder has no bands".into()));
        }
        let in_range = |s: i32| (-3..=3).contains(&s);
        if !in_range(self.floor_score) {
            return Err(ScoringError::InvalidThresholds(format!(
                "floor score {} outside [-3, 3]",
                self.floor_score
            )));
        }
        for band in &self.bands {
            if !band.min_percent.is_finite() {
                return Err(ScoringError::InvalidThresholds(format!(
                    "bound {} is not finite",
                    band.min_percent
                )));
            }
            if !in_range(band.score) {
                return Err(ScoringError::InvalidThresholds(format!(
                    "score {} outside [-3, 3]",
                    band.score
                )));
            }
        }
        if let Some(w) = self.bands.windows(2).find(|w| w[0].min_percent <= w[1].min_percent) {
            return Err(ScoringError::InvalidThresholds(format!(
                "bounds must be strictly descending ({} then {})",
                w[0].min_percent, w[1].min_percent
            )));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.weight_pair(), (80, 20));
        assert_eq!(config.existing_building_status, 1004);
        assert_eq!(config.ratio.bands.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_ratio_weight_is_kept() {
        let config = ScoringConfig {
            geb_weight: 60,
            verh_weight: Some(30),
            ..Default::default()
        };
        assert_eq!(config.weight_pair(), (60, 30));
    }

    #[test]
    fn test_ascending_ladder_rejected() {
        let mut ratio = RatioThresholds::default();
        ratio.bands.swap(0, 1);
        assert!(matches!(ratio.validate(), Err(ScoringError::InvalidThresholds(_))));
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let mut ratio = RatioThresholds::default();
        ratio.bands[0].score = 4;
        assert!(ratio.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ScoringConfig = toml::from_str("geb_weight = 50").unwrap();
        assert_eq!(config.weight_pair(), (50, 50));
        assert_eq!(config.ratio, RatioThresholds::default());
    }

    #[test]
    fn test_extreme_geb_weight_does_not_overflow() {
        let config = ScoringConfig { geb_weight: i32::MIN, ..Default::default() };
        assert_eq!(config.weight_pair(), (i32::MIN, i32::MAX));
        let config = ScoringConfig { geb_weight: i32::MAX, ..Default::default() };
        assert_eq!(config.weight_pair(), (i32::MAX, 100 - i32::MAX));
    }

    #[test]
    fn test_from_path_by_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let yaml = dir.join("scoring.yaml");
        let config = ScoringConfig { geb_weight: 30, ..Default::default() };
        config.to_yaml(&yaml).unwrap();
        assert_eq!(ScoringConfig::from_path(&yaml).unwrap(), config);

        let json = dir.join("scoring.json");
        std::fs::write(&json, r#"{"geb_weight": 70, "verh_weight": 30}"#).unwrap();
        assert_eq!(ScoringConfig::from_path(&json).unwrap().weight_pair(), (70, 30));

        let toml_path = dir.join("scoring.toml");
        std::fs::write(&toml_path, "geb_weight = 40\n").unwrap();
        assert_eq!(ScoringConfig::from_path(&toml_path).unwrap().weight_pair(), (40, 60));

        let other = dir.join("scoring.ini");
        std::fs::write(&other, "").unwrap();
        assert!(matches!(ScoringConfig::from_path(&other), Err(SuperblockError::Config(_))));

    }

    #[test]
    fn test_from_path_validates_ladder() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let path = dir.join("scoring.json");
        std::fs::write(&path, r#"{"ratio": {"bands": [{"min_percent": 10.0, "score": 1}, {"min_percent": 50.0, "score": 2}]}}"#)
            .unwrap();
        assert!(matches!(
            ScoringConfig::from_path(&path),
            Err(SuperblockError::Scoring(ScoringError::InvalidThresholds(_)))
        ));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
