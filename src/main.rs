use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use bj_pilot::PilotConfig;

#[derive(Parser)]
#[command(name = "bj-pilot", about = "Table-driven blackjack autopilot")]
struct Cli {
    /// JSON config file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Strategy table, overrides the config file
    #[arg(long)]
    strategy: Option<PathBuf>,

    /// Recorded session to play against
    #[arg(long, default_value = "data/replay-sample.json")]
    replay: PathBuf,

    /// Start running instead of paused
    #[arg(long)]
    armed: bool,

    /// Always surrender 15 against 10, ignoring the specific card
    #[arg(long)]
    no_surrender_15: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    bj_pilot::init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PilotConfig::load(path)?,
        None => PilotConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config.strategy_path = strategy;
    }
    if cli.no_surrender_15 {
        config.surrender_15_specific = false;
    }

    bj_pilot::run(config, &cli.replay, cli.armed).await
}
