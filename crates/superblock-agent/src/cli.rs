use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "superblock")]
#[command(about = "Score candidate superblocks by building use and block shape", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "SUPERBLOCK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Scoring file (YAML, JSON or TOML); replaces the config's scoring section
    #[arg(short, long, global = true)]
    pub scoring: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score candidate blocks and write the final dataset into a new run folder
    Score(ScoreArgs),

    /// Print the quantile breakpoints and band counts of the building score sum
    Breakpoints {
        /// Candidate block dataset (.csv, .geojson or .json)
        input: PathBuf,
    },

    /// List the weighting presets
    Presets,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Candidate block dataset (.csv, .geojson or .json)
    pub input: PathBuf,

    /// Building dataset (GWR or cantonal); derives the per-parcel building score sums
    #[arg(short, long)]
    pub buildings: Option<PathBuf>,

    /// Building score weight in percent; the ratio weight is the remainder
    #[arg(long, conflicts_with = "preset", value_parser = clap::value_parser!(i32).range(0..=100))]
    pub geb_weight: Option<i32>,

    /// Weighting preset index (0 = 80/20 … 6 = 20/80)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
    pub preset: Option<u8>,

    /// Directory for run folders (overrides [workspace].path)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,
}
