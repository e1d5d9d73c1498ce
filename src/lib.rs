mod classifier;
mod commands;
mod config;
mod context;
mod control;
mod executor;
mod pipeline;

pub use classifier::classify;
pub use commands::{read_commands, spawn_keyboard, watch_ctrl_c, Command};
pub use config::{PilotConfig, Timings};
pub use context::Context;
pub use control::ControlHandle;
pub use executor::{ActionExecutor, HandKind};
pub use pipeline::Pilot;

use anyhow::{Context as _, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use bj_capture::ReplayTable;
use bj_data::StrategyTable;

/// How often the replay watcher checks whether the recording is used up
const REPLAY_WATCH_INTERVAL: Duration = Duration::from_millis(100);

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bj_pilot=info,bj_advisor=info,bj_capture=info".into()),
        )
        .init();
}

/// Play a recorded session until it is exhausted or exit is requested
pub async fn run(config: PilotConfig, replay_path: &Path, armed: bool) -> Result<()> {
    let table = StrategyTable::load(&config.strategy_path)?;
    let replay = ReplayTable::load(replay_path)?;

    let control = ControlHandle::new();
    if armed {
        control.arm();
    }

    let mut pilot = Pilot::from_config(
        replay.clone(),
        replay.clone(),
        Arc::new(table),
        &config,
        control.clone(),
    );

    spawn_keyboard(control.clone());
    tokio::spawn(watch_ctrl_c(control.clone()));
    let watcher = tokio::spawn(watch_replay(replay, control.clone()));

    let report = tokio::spawn(async move {
        pilot.run().await;
        pilot.stats().report()
    })
    .await
    .context("Pilot loop panicked")?;
    watcher.abort();

    info!(
        "Session finished: {} hands, {} bets in {:.1} min",
        report.hands_played, report.bets_placed, report.elapsed_minutes
    );
    Ok(())
}

/// Request exit once every recorded frame has been played
pub async fn watch_replay(replay: ReplayTable, control: ControlHandle) {
    while !control.exit_requested() {
        if replay.is_exhausted() {
            info!("Replay exhausted");
            control.request_exit();
            break;
        }
        tokio::time::sleep(REPLAY_WATCH_INTERVAL).await;
    }
}
