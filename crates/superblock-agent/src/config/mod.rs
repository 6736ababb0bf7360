//! Configuration loading for the superblock scorer.
//! Reads superblock.toml from the path given on the command line, the
//! SUPERBLOCK_CONFIG env var, or the current directory.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use superblock_common::ScoringConfig;
use superblock_db::{BuildingFieldMapping, FieldMapping};

pub const CONFIG_ENV: &str = "SUPERBLOCK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "superblock.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Separate scoring file (YAML, JSON or TOML) replacing `[scoring]`.
    /// Relative paths resolve against the config file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_file: Option<PathBuf>,
    #[serde(default)]
    pub fields: FieldMapping,
    #[serde(default)]
    pub buildings: BuildingFieldMapping,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory receiving the `superblock_run_<n>` folders.
    #[serde(default = "default_workspace_path")]
    pub path: String,
    /// Keep the run folder when a run fails.
    #[serde(default)]
    pub keep_failed_runs: bool,
}

fn default_workspace_path() -> String { "./workspace".to_string() }

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            path: default_workspace_path(),
            keep_failed_runs: false,
        }
    }
}

mod tests;

impl Config {
    /// Load configuration.
    ///
    /// An explicit path (flag or SUPERBLOCK_CONFIG) must exist. Without
    /// one, ./superblock.toml is used if present, defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        Self::load_or_default(explicit, Path::new(DEFAULT_CONFIG_FILE))
    }

    fn load_or_default(explicit: Option<PathBuf>, default_file: &Path) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                path
            }
            None => {
                if !default_file.exists() {
                    tracing::debug!("No {} found, using defaults", default_file.display());
                    return Ok(Self::default());
                }
                default_file.to_path_buf()
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Self::parse(content, Path::new("."))
    }

    fn parse(content: &str, base: &Path) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        if let Some(file) = config.scoring_file.clone() {
            config.replace_scoring(&base.join(file))?;
        }
        config.scoring.validate()?;
        Ok(config)
    }

    /// Replace the scoring section with the contents of a YAML, JSON or
    /// TOML scoring file.
    pub fn replace_scoring(&mut self, path: &Path) -> anyhow::Result<()> {
        self.scoring = ScoringConfig::from_path(path)
            .with_context(|| format!("Invalid scoring file {}", path.display()))?;
        self.scoring_file = Some(path.to_path_buf());
        Ok(())
    }
}
