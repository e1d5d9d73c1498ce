//! Turns a decision into clicks.
//!
//! Perception lags the real table, so every action re-reads the buttons
//! after a settle delay and only clicks what is still there. Each action
//! returns `Ok(false)` when nothing was clicked; the caller then simply
//! tries again on a later tick.

use anyhow::Result;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use bj_capture::{poll_until, ButtonName, ButtonSet, Clicker, Perception, PollOutcome, ScreenRect};
use bj_state::{Action, PlayerToken};

use crate::config::{ms, Timings};
use crate::context::Context;

/// Which strategy table a decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandKind {
    Hard,
    Soft,
}

impl HandKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Hard => "",
            Self::Soft => " (soft)",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionExecutor {
    timings: Timings,
}

impl ActionExecutor {
    pub fn new(timings: Timings) -> Self {
        Self { timings }
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Place the next bet. Uses the buttons already read this tick.
    pub async fn rebet<P: Perception, C: Clicker>(
        &self,
        cx: &mut Context<P, C>,
        buttons: &ButtonSet,
    ) -> Result<bool> {
        let Some(rect) = buttons.get(ButtonName::RebetDealAvailable) else {
            return Ok(false);
        };
        cx.click(ButtonName::RebetDealAvailable, rect)?;
        cx.stats.record_bet();
        cx.session.reset_for_new_hand();
        info!("Bet #{} placed", cx.stats.bets_placed());
        cx.settle(self.timings.rebet_settle_ms).await;
        Ok(true)
    }

    pub async fn hit<P: Perception, C: Clicker>(
        &self,
        cx: &mut Context<P, C>,
        player: PlayerToken,
        kind: HandKind,
    ) -> Result<bool> {
        let Some(rect) = self.verify(cx, ButtonName::HitAvailable).await else {
            return Ok(false);
        };
        cx.click(ButtonName::HitAvailable, rect)?;
        info!("Action: HIT{}", kind.label());
        cx.session.last_action = Action::Hit;
        cx.session.invalidate_hand();
        let deadline = Instant::now() + ms(self.timings.change_timeout_ms);
        cx.session.arm_card_change(player, deadline);
        Ok(true)
    }

    pub async fn stand<P: Perception, C: Clicker>(
        &self,
        cx: &mut Context<P, C>,
        kind: HandKind,
    ) -> Result<bool> {
        let Some(rect) = self.verify(cx, ButtonName::StandAvailable).await else {
            return Ok(false);
        };
        cx.click(ButtonName::StandAvailable, rect)?;
        info!("Action: STAND{}", kind.label());
        cx.session.last_action = Action::Stand;
        cx.settle(self.timings.stand_settle_ms).await;

        // The next sub-hand is decided as a fresh split hand
        if cx.session.in_split_hand {
            cx.session.last_action = Action::Split;
            info!("Split hand complete - ready for next split hand");
        }
        Ok(true)
    }

    pub async fn double<P: Perception, C: Clicker>(
        &self,
        cx: &mut Context<P, C>,
        kind: HandKind,
    ) -> Result<bool> {
        let (settle, post) = match kind {
            HandKind::Hard => (self.timings.double_hard_settle_ms, self.timings.double_hard_post_ms),
            HandKind::Soft => (self.timings.double_soft_settle_ms, self.timings.double_soft_post_ms),
        };
        if !cx.settle(settle).await {
            return Ok(false);
        }
        let Some(rect) = cx.perception.check_buttons().get(ButtonName::DoubleAvailable) else {
            debug!("Double button gone after settle");
            return Ok(false);
        };

        let before = cx.perception.read_player_value();
        cx.click(ButtonName::DoubleAvailable, rect)?;
        info!("Action: DOUBLE{}", kind.label());
        cx.stats.record_bet();
        cx.session.last_action = Action::Double;
        cx.session.invalidate_hand();
        if !cx.settle(post).await {
            return Ok(true);
        }

        if cx.session.in_split_hand {
            // The next sub-hand must not be played off the doubled hand's value
            match self.wait_for_player_change(cx, before).await {
                PollOutcome::Observed(now) => info!(
                    "Split hand card changed: {} -> {}",
                    show_value(before),
                    now
                ),
                PollOutcome::TimedOut => {
                    warn!("Timeout waiting for next split hand after double")
                }
                PollOutcome::Cancelled => {}
            }
        } else {
            cx.session.last_player_value = cx.perception.read_player_value();
        }
        Ok(true)
    }

    pub async fn split<P: Perception, C: Clicker>(
        &self,
        cx: &mut Context<P, C>,
        pair: PlayerToken,
    ) -> Result<bool> {
        if !cx.settle(self.timings.split_settle_ms).await {
            return Ok(false);
        }
        let Some(rect) = cx.perception.check_buttons().get(ButtonName::SplitAvailable) else {
            debug!("Split button gone after settle");
            return Ok(false);
        };

        let before = cx.perception.read_player_value();
        cx.click(ButtonName::SplitAvailable, rect)?;
        info!("Strategy: SPLIT {} | Action: SPLIT", pair);
        cx.stats.record_bet();
        cx.session.last_action = Action::Split;
        cx.session.in_split_hand = true;
        cx.session.invalidate_hand();
        if !cx.settle(self.timings.split_validate_ms).await {
            return Ok(true);
        }

        if !cx.perception.check_buttons().any_gameplay() {
            warn!("Split not confirmed - no gameplay buttons after split, ignoring");
            cx.session.last_action = Action::None;
            cx.session.in_split_hand = false;
            cx.session.invalidate_hand();
            return Ok(false);
        }

        info!("Split validated - continuing with split hand");
        match self.wait_for_player_change(cx, before).await {
            PollOutcome::Observed(now) => {
                info!("Split hand ready: {} -> {}", show_value(before), now)
            }
            PollOutcome::TimedOut => warn!("Timeout waiting for split hand card change"),
            PollOutcome::Cancelled => {}
        }
        Ok(true)
    }

    pub async fn surrender<P: Perception, C: Clicker>(
        &self,
        cx: &mut Context<P, C>,
    ) -> Result<bool> {
        if !cx.settle(self.timings.surrender_settle_ms).await {
            return Ok(false);
        }
        let Some(rect) = cx.perception.check_buttons().get(ButtonName::SurrenderAvailable) else {
            debug!("Surrender button gone after settle");
            return Ok(false);
        };
        cx.click(ButtonName::SurrenderAvailable, rect)?;
        info!("Strategy: SURRENDER | Action: SURRENDER");
        cx.session.last_action = Action::Surrender;
        cx.session.invalidate_hand();
        Ok(true)
    }

    /// Re-read the buttons after a settle delay and return `target` if it is
    /// still visible.
    async fn verify<P: Perception, C: Clicker>(
        &self,
        cx: &mut Context<P, C>,
        target: ButtonName,
    ) -> Option<ScreenRect> {
        if !cx.settle(self.timings.verify_settle_ms).await {
            return None;
        }
        let buttons = cx.perception.check_buttons();
        let Some(rect) = buttons.get(target) else {
            debug!("{} gone after settle", target);
            return None;
        };
        // Advisory only: the two buttons sit close together on some layouts
        if target != ButtonName::DoubleAvailable && buttons.contains(ButtonName::DoubleAvailable) {
            warn!("Both {} and DoubleAvailable visible - verifying button location", target);
            cx.settle(self.timings.double_nearby_pause_ms).await;
        }
        Some(rect)
    }

    async fn wait_for_player_change<P: Perception, C: Clicker>(
        &self,
        cx: &mut Context<P, C>,
        before: Option<PlayerToken>,
    ) -> PollOutcome<PlayerToken> {
        let perception = &mut cx.perception;
        poll_until(
            cx.control.exit_flag(),
            ms(self.timings.change_poll_interval_ms),
            ms(self.timings.change_timeout_ms),
            || perception.read_player_value().filter(|now| Some(*now) != before),
        )
        .await
    }
}

fn show_value(value: Option<PlayerToken>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}
