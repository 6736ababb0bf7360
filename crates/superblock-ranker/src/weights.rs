//! Percentage split between the building-use score and the shape score.

use serde::{Deserialize, Serialize};
use superblock_common::{ScoringConfig, ScoringError};

/// Number of preset splits (80/20 down to 20/80).
pub const PRESET_COUNT: usize = 7;

/// Validated weight pair. Both parts are non-negative and sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weighting {
    /// Building-use score weight in percent
    geb: i32,
    /// Width/height ratio score weight in percent
    verh: i32,
}

impl Default for Weighting {
    /// 80 % building use, 20 % shape
    fn default() -> Self {
        Self { geb: 80, verh: 20 }
    }
}

impl Weighting {
    pub fn new(geb: i32, verh: i32) -> Result<Self, ScoringError> {
        // i64 sum: any two i32 values fit without overflow
        if geb < 0 || verh < 0 || i64::from(geb) + i64::from(verh) != 100 {
            return Err(ScoringError::InvalidWeight { geb, verh });
        }
        Ok(Self { geb, verh })
    }

    /// Single-parameter form: `geb` in [0, 100], the rest goes to the ratio.
    pub fn from_building_percent(geb: i32) -> Result<Self, ScoringError> {
        Self::new(geb, 100i32.saturating_sub(geb))
    }

    /// Preset `index` (0..7): 80/20, 70/30, …, 20/80.
    pub fn preset(index: usize) -> Result<Self, ScoringError> {
        if index >= PRESET_COUNT {
            return Err(ScoringError::InvalidPreset(index));
        }
        Self::from_building_percent(80 - 10 * index as i32)
    }

    /// All presets in index order.
    pub fn presets() -> impl Iterator<Item = Weighting> {
        (0..PRESET_COUNT as i32).map(|i| Self {
            geb: 80 - 10 * i,
            verh: 20 + 10 * i,
        })
    }

    pub fn geb(&self) -> i32 {
        self.geb
    }

    pub fn verh(&self) -> i32 {
        self.verh
    }

    /// Weighted composite of two band scores, rounded half away from zero.
    ///
    /// The sum is kept in integer hundredths so `.5` ties round the same way
    /// on every platform.
    pub fn composite(&self, building_score: i32, ratio_score: i32) -> i32 {
        let total = self.geb * building_score + self.verh * ratio_score;
        if total >= 0 {
            (total + 50) / 100
        } else {
            -((-total + 50) / 100)
        }
    }
}

impl TryFrom<&ScoringConfig> for Weighting {
    type Error = ScoringError;

    fn try_from(config: &ScoringConfig) -> Result<Self, Self::Error> {
        let (geb, verh) = config.weight_pair();
        Self::new(geb, verh)
    }
}

impl std::fmt::Display for Weighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "building {}% / ratio {}%", self.geb, self.verh)
    }
}
