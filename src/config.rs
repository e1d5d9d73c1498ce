use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settle delays, poll intervals and timeouts, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Wait before re-checking the hit/stand button
    pub verify_settle_ms: u64,
    /// Extra pause when the double button sits next to the target
    pub double_nearby_pause_ms: u64,
    pub stand_settle_ms: u64,
    pub double_hard_settle_ms: u64,
    pub double_soft_settle_ms: u64,
    pub double_hard_post_ms: u64,
    pub double_soft_post_ms: u64,
    pub split_settle_ms: u64,
    pub split_validate_ms: u64,
    pub surrender_settle_ms: u64,
    pub rebet_settle_ms: u64,
    pub change_poll_interval_ms: u64,
    pub change_timeout_ms: u64,
    pub card_change_tick_ms: u64,
    pub tick_yield_ms: u64,
    pub idle_backoff_ms: u64,
    pub paused_tick_ms: u64,
    pub error_backoff_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            verify_settle_ms: 150,
            double_nearby_pause_ms: 50,
            stand_settle_ms: 200,
            double_hard_settle_ms: 300,
            double_soft_settle_ms: 50,
            double_hard_post_ms: 300,
            double_soft_post_ms: 150,
            split_settle_ms: 150,
            split_validate_ms: 500,
            surrender_settle_ms: 300,
            rebet_settle_ms: 50,
            change_poll_interval_ms: 50,
            change_timeout_ms: 2000,
            card_change_tick_ms: 5,
            tick_yield_ms: 5,
            idle_backoff_ms: 10,
            paused_tick_ms: 50,
            error_backoff_ms: 100,
        }
    }
}

pub(crate) fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Pilot configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub strategy_path: PathBuf,
    /// Hit 15 against 10 instead of surrendering when the specific card is a 7 or 8
    pub surrender_15_specific: bool,
    pub timings: Timings,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            strategy_path: PathBuf::from("data/strategy.json"),
            surrender_15_specific: true,
            timings: Timings::default(),
        }
    }
}

impl PilotConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: PilotConfig = serde_json::from_str(
            r#"{ "surrender_15_specific": false, "timings": { "change_timeout_ms": 3000 } }"#,
        )
        .unwrap();
        assert!(!config.surrender_15_specific);
        assert_eq!(config.strategy_path, PathBuf::from("data/strategy.json"));
        assert_eq!(config.timings.change_timeout_ms, 3000);
        assert_eq!(config.timings.split_validate_ms, 500);
    }

    #[test]
    fn test_load_nonexistent() {
        assert!(PilotConfig::load(Path::new("/nonexistent/pilot.json")).is_err());
    }
}
