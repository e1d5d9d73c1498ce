use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Session counters. Never reset during a run.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    hands_played: u32,
    bets_placed: u32,
    started_at: Option<Instant>,
}

/// Snapshot of [`Statistics`] for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub hands_played: u32,
    pub bets_placed: u32,
    pub elapsed_minutes: f64,
    pub hands_per_hour: f64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock. Later calls keep the first start time.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn record_bet(&mut self) {
        self.bets_placed += 1;
    }

    /// Count a new hand and return its number.
    pub fn record_hand(&mut self) -> u32 {
        self.hands_played += 1;
        self.hands_played
    }

    pub fn hands_played(&self) -> u32 {
        self.hands_played
    }

    pub fn bets_placed(&self) -> u32 {
        self.bets_placed
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    pub fn hands_per_hour(&self) -> f64 {
        let hours = self.elapsed().as_secs_f64() / 3600.0;
        if hours > 0.0 {
            self.hands_played as f64 / hours
        } else {
            0.0
        }
    }

    pub fn report(&self) -> StatsReport {
        StatsReport {
            hands_played: self.hands_played,
            bets_placed: self.bets_placed,
            elapsed_minutes: self.elapsed().as_secs_f64() / 60.0,
            hands_per_hour: self.hands_per_hour(),
        }
    }

    pub fn log_report(&self) {
        if !self.is_started() {
            return;
        }
        let report = self.report();
        info!(
            "Hands played: {} | Bets placed: {} | Elapsed: {:.2} min | Hands/hour: {:.2}",
            report.hands_played, report.bets_placed, report.elapsed_minutes, report.hands_per_hour
        );
    }
}
