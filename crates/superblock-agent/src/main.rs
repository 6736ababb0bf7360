//! Superblock scorer — ranks candidate urban blocks for traffic calming.
//! Entry point for the `superblock` binary.

mod cli;
mod config;
mod logging;
mod pipeline;
mod workspace;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let run_log = logging::init();

    info!("🏙️  Superblock scorer v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.scoring {
        config.replace_scoring(path)?;
    }

    match cli.command {
        Commands::Score(args) => {
            pipeline::apply_weight_override(&mut config.scoring, args.geb_weight, args.preset)?;
            let job = pipeline::ScoreJob {
                input: args.input,
                buildings: args.buildings,
                workspace: args
                    .workspace
                    .unwrap_or_else(|| PathBuf::from(&config.workspace.path)),
            };
            let manifest = pipeline::run_score(&config, &job, &run_log)?;
            println!("{}", manifest.output);
        }
        Commands::Breakpoints { input } => {
            let outcome = pipeline::inspect_breakpoints(&config, &input)?;
            print!("{}", pipeline::format_breakpoints(&outcome));
        }
        Commands::Presets => {
            print!("{}", pipeline::format_presets());
        }
    }

    Ok(())
}
