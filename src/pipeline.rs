use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use bj_advisor::{StrategyDecider, SurrenderDecision};
use bj_capture::{sleep_checked, ButtonSet, Clicker, Perception};
use bj_data::{HardCode, SoftCode, StrategyTable};
use bj_state::{Action, DealerToken, GamePhase, HandMarker, PlayerToken, SessionState, Statistics};

use crate::classifier::classify;
use crate::config::{ms, PilotConfig, Timings};
use crate::context::Context;
use crate::control::ControlHandle;
use crate::executor::{ActionExecutor, HandKind};

/// The control loop: classify → read → decide → act, one cycle per tick.
pub struct Pilot<P, C> {
    cx: Context<P, C>,
    decider: StrategyDecider,
    executor: ActionExecutor,
    timings: Timings,
}

impl<P: Perception, C: Clicker> Pilot<P, C> {
    pub fn new(
        perception: P,
        clicker: C,
        decider: StrategyDecider,
        timings: Timings,
        control: ControlHandle,
    ) -> Self {
        Self {
            cx: Context::new(perception, clicker, control),
            decider,
            executor: ActionExecutor::new(timings.clone()),
            timings,
        }
    }

    pub fn from_config(
        perception: P,
        clicker: C,
        table: Arc<StrategyTable>,
        config: &PilotConfig,
        control: ControlHandle,
    ) -> Self {
        let decider = StrategyDecider::new(table, config.surrender_15_specific);
        Self::new(perception, clicker, decider, config.timings.clone(), control)
    }

    pub fn session(&self) -> &SessionState {
        &self.cx.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.cx.session
    }

    pub fn stats(&self) -> &Statistics {
        &self.cx.stats
    }

    pub fn control(&self) -> &ControlHandle {
        &self.cx.control
    }

    /// Run until exit is requested. Ticks only while armed.
    pub async fn run(&mut self) {
        info!("Pilot loop started");
        let mut was_running = false;

        loop {
            if self.cx.control.exit_requested() {
                info!("Exit requested");
                break;
            }

            let running = self.cx.control.is_running();
            if running != was_running {
                if running {
                    self.cx.stats.start();
                    info!("Pilot armed");
                } else {
                    info!("Pilot paused");
                    self.cx.stats.log_report();
                }
                was_running = running;
            }

            if !running {
                tokio::time::sleep(ms(self.timings.paused_tick_ms)).await;
                continue;
            }

            let backoff = match self.tick().await {
                Ok(backoff) => backoff,
                Err(e) => {
                    warn!("Error in pilot loop: {:#}", e);
                    ms(self.timings.error_backoff_ms)
                }
            };
            sleep_checked(self.cx.control.exit_flag(), backoff).await;
        }

        self.cx.stats.log_report();
        info!("Pilot loop stopped");
    }

    /// One classify → decide → act cycle. Returns how long to back off
    /// before the next tick.
    pub async fn tick(&mut self) -> Result<Duration> {
        let buttons = self.cx.perception.check_buttons();
        let phase = classify(&buttons, &self.cx.session);
        debug!("Phase: {:?}", phase);

        match phase {
            GamePhase::WaitingForCardChange => Ok(self.await_card_change()),
            GamePhase::WaitingForRebet => {
                self.executor.rebet(&mut self.cx, &buttons).await?;
                Ok(ms(self.timings.tick_yield_ms))
            }
            GamePhase::HandComplete => {
                self.report_hand_complete();
                Ok(ms(self.timings.idle_backoff_ms))
            }
            GamePhase::ActiveGame => self.play(&buttons).await,
        }
    }

    /// One step of the post-hit wait for the player value to move
    fn await_card_change(&mut self) -> Duration {
        let Some(wait) = self.cx.session.card_change().cloned() else {
            return ms(self.timings.tick_yield_ms);
        };

        let current = self.cx.perception.read_player_value();
        if let Some(now) = current.filter(|now| *now != wait.previous) {
            debug!("Card changed: {} -> {}", wait.previous, now);
            self.cx.session.clear_card_change();
            self.cx.session.invalidate_hand();
            return ms(self.timings.tick_yield_ms);
        }

        if Instant::now() >= wait.deadline {
            warn!("Timeout waiting for card change (player stuck at {})", wait.previous);
            self.cx.session.clear_card_change();
            self.cx.session.invalidate_hand();
            return ms(self.timings.tick_yield_ms);
        }
        ms(self.timings.card_change_tick_ms)
    }

    fn report_hand_complete(&mut self) {
        let session = &mut self.cx.session;
        if session.hand_complete_printed
            || self.cx.stats.hands_played() == 0
            || session.current_hand() == Some(&HandMarker::AwaitingDeal)
        {
            return;
        }
        info!("Hand #{} complete - waiting for rebet", self.cx.stats.hands_played());
        session.hand_complete_printed = true;
    }

    async fn play(&mut self, buttons: &ButtonSet) -> Result<Duration> {
        let idle = ms(self.timings.idle_backoff_ms);
        let Some(player) = self.cx.perception.read_player_value() else {
            debug!("Player value unreadable ({} buttons visible)", buttons.len());
            return Ok(idle);
        };
        let Some(mut dealer) = self.read_dealer() else {
            debug!("Dealer value unreadable");
            return Ok(idle);
        };
        if self.begin_hand(player, dealer) {
            // New pairing in the same chain: the upcard may have come from the cache
            if let Some(fresh) = self.read_dealer().filter(|fresh| *fresh != dealer) {
                debug!("Dealer re-read: {} -> {}", dealer, fresh);
                self.cx.session.observe_hand(HandMarker::Seen { player, dealer: fresh });
                dealer = fresh;
            }
        }

        let next = ms(self.timings.tick_yield_ms);
        if self.decide_split(&player, &dealer).await? {
            return Ok(next);
        }
        if self.decide_surrender(&player, &dealer).await? {
            return Ok(next);
        }
        let acted = if player.is_soft() {
            self.play_soft(player, &dealer).await?
        } else {
            self.play_hard(player, &dealer).await?
        };
        if !acted {
            debug!("No action taken for {} vs {}", player, dealer);
        }
        Ok(next)
    }

    /// Dealer upcard, from the cache while the action chain is unchanged
    fn read_dealer(&mut self) -> Option<DealerToken> {
        let key = self.cx.session.dealer_cache_key(self.cx.stats.bets_placed());
        if let Some(cached) = self.cx.session.cached_dealer(key) {
            return Some(cached);
        }
        let previous = self.cx.session.previous_dealer();
        let dealer = self.cx.perception.read_dealer_value(previous)?;
        self.cx.session.cache_dealer(key, dealer);
        Some(dealer)
    }

    /// Track the (player, dealer) pairing and detect new hands. Returns
    /// `true` when a seen pairing was replaced and the dealer cache dropped.
    fn begin_hand(&mut self, player: PlayerToken, dealer: DealerToken) -> bool {
        let marker = HandMarker::Seen { player, dealer };
        let session = &mut self.cx.session;
        if session.current_hand() == Some(&marker) {
            return false;
        }

        let after_deal = session.current_hand() == Some(&HandMarker::AwaitingDeal);
        if after_deal {
            let number = self.cx.stats.record_hand();
            info!(">>> Starting hand #{}", number);
            session.hand_complete_printed = false;
        }
        info!("Cards: Player={} | Dealer={}", player, dealer);
        if session.in_split_hand {
            info!("Split hand - last action: {}", session.last_action);
        }
        if !after_deal && !matches!(session.last_action, Action::Rebet | Action::Split) {
            session.last_action = Action::None;
        }
        session.observe_hand(marker)
    }

    async fn decide_split(&mut self, player: &PlayerToken, dealer: &DealerToken) -> Result<bool> {
        let session = &self.cx.session;
        if session.last_action == Action::None && !session.in_split_hand {
            return Ok(false);
        }
        match self
            .decider
            .should_split(player, dealer, session.last_action, session.in_split_hand)
        {
            Some(pair) => self.executor.split(&mut self.cx, pair).await,
            None => Ok(false),
        }
    }

    async fn decide_surrender(
        &mut self,
        player: &PlayerToken,
        dealer: &DealerToken,
    ) -> Result<bool> {
        let last_action = self.cx.session.last_action;
        let perception = &mut self.cx.perception;
        let decision = self
            .decider
            .should_surrender(player, dealer, last_action, || perception.read_specific_card());

        match decision {
            SurrenderDecision::HitInstead => {
                info!("Strategy: HIT (15 vs 10 with 7-8) | Action: HIT");
                self.executor.hit(&mut self.cx, *player, HandKind::Hard).await
            }
            SurrenderDecision::Surrender => self.executor.surrender(&mut self.cx).await,
            SurrenderDecision::Decline => Ok(false),
        }
    }

    async fn play_soft(&mut self, player: PlayerToken, dealer: &DealerToken) -> Result<bool> {
        match self.decider.soft_action(&player, dealer) {
            SoftCode::Hit => self.executor.hit(&mut self.cx, player, HandKind::Soft).await,
            SoftCode::Stand => self.executor.stand(&mut self.cx, HandKind::Soft).await,
            SoftCode::Double => {
                if self.try_double(HandKind::Soft).await? {
                    return Ok(true);
                }
                info!("Strategy: DOUBLE (soft) | Action: HIT (can't double)");
                self.executor.hit(&mut self.cx, player, HandKind::Soft).await
            }
            SoftCode::DoubleOrStand => {
                if self.try_double(HandKind::Soft).await? {
                    return Ok(true);
                }
                info!("Strategy: DOUBLE/STAND (soft) | Action: STAND (can't double)");
                self.executor.stand(&mut self.cx, HandKind::Soft).await
            }
        }
    }

    async fn play_hard(&mut self, player: PlayerToken, dealer: &DealerToken) -> Result<bool> {
        match self.decider.hard_action(&player, dealer) {
            HardCode::Hit => self.executor.hit(&mut self.cx, player, HandKind::Hard).await,
            HardCode::Stand => self.executor.stand(&mut self.cx, HandKind::Hard).await,
            HardCode::Double => {
                if self.try_double(HandKind::Hard).await? {
                    return Ok(true);
                }
                info!("Strategy: DOUBLE | Action: HIT (can't double)");
                self.executor.hit(&mut self.cx, player, HandKind::Hard).await
            }
        }
    }

    async fn try_double(&mut self, kind: HandKind) -> Result<bool> {
        let allowed = self
            .decider
            .can_double(
                self.cx.session.last_action,
                self.cx.session.in_split_hand,
                &mut self.cx.perception,
                self.cx.control.exit_flag(),
            )
            .await;
        if !allowed {
            return Ok(false);
        }
        self.executor.double(&mut self.cx, kind).await
    }
}
