//! Table-driven play decisions.
//!
//! Every decision is a lookup into a [`StrategyTable`] filtered by the state
//! of the current hand chain. Missing table entries fall back to standing.

use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use bj_capture::{poll_until, ButtonName, Perception, PollOutcome};
use bj_data::{HardCode, SoftCode, StrategyTable};
use bj_state::{Action, DealerToken, PlayerToken, SpecificCard};

/// How often [`StrategyDecider::can_double`] looks for the double button
pub const DOUBLE_PROBE_ATTEMPTS: u32 = 3;
pub const DOUBLE_PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of the surrender check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurrenderDecision {
    Surrender,
    /// The table says surrender, but the hand should be hit instead
    HitInstead,
    Decline,
}

impl SurrenderDecision {
    pub fn should_surrender(&self) -> bool {
        matches!(self, Self::Surrender)
    }

    pub fn should_hit(&self) -> bool {
        matches!(self, Self::HitInstead)
    }
}

/// Player totals that can also be a pair of identical cards
pub fn pair_notation(player: &PlayerToken) -> Option<PlayerToken> {
    match player {
        PlayerToken::Hard(4 | 6 | 8 | 12 | 14 | 16 | 18) | PlayerToken::Soft { low: 2 } => {
            Some(*player)
        }
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct StrategyDecider {
    table: Arc<StrategyTable>,
    surrender_15_specific: bool,
}

impl StrategyDecider {
    pub fn new(table: Arc<StrategyTable>, surrender_15_specific: bool) -> Self {
        Self {
            table,
            surrender_15_specific,
        }
    }

    /// Pair to split, if the hand is eligible and the table says split.
    ///
    /// A hand that has already been hit can only be split as part of an
    /// unresolved split chain.
    pub fn should_split(
        &self,
        player: &PlayerToken,
        dealer: &DealerToken,
        last_action: Action,
        in_split_hand: bool,
    ) -> Option<PlayerToken> {
        if last_action == Action::Hit && !in_split_hand {
            return None;
        }
        let pair = pair_notation(player)?;
        self.table
            .split(&pair.to_string(), &dealer.to_string())
            .unwrap_or(false)
            .then_some(pair)
    }

    /// Surrender is only offered on the first decision of a hard hand.
    ///
    /// `specific_card` is only called for 15 against 10, when a 7 or 8 in
    /// the specific-card region turns the surrender into a hit.
    pub fn should_surrender<F>(
        &self,
        player: &PlayerToken,
        dealer: &DealerToken,
        last_action: Action,
        specific_card: F,
    ) -> SurrenderDecision
    where
        F: FnOnce() -> Option<SpecificCard>,
    {
        if last_action != Action::Rebet || player.is_soft() {
            return SurrenderDecision::Decline;
        }
        let surrender = self
            .table
            .surrender(&player.to_string(), &dealer.to_string())
            .unwrap_or(false);
        if !surrender {
            return SurrenderDecision::Decline;
        }

        if self.surrender_15_specific
            && *player == PlayerToken::Hard(15)
            && *dealer == DealerToken::Pip(10)
        {
            let card = specific_card();
            debug!("15 vs 10 specific card: {:?}", card);
            if card.is_some_and(|c| c.is_seven_or_eight()) {
                return SurrenderDecision::HitInstead;
            }
        }
        SurrenderDecision::Surrender
    }

    pub fn soft_action(&self, player: &PlayerToken, dealer: &DealerToken) -> SoftCode {
        self.table
            .soft(&player.to_string(), &dealer.to_string())
            .unwrap_or(SoftCode::Stand)
    }

    pub fn hard_action(&self, player: &PlayerToken, dealer: &DealerToken) -> HardCode {
        self.table
            .hard(&player.to_string(), &dealer.to_string())
            .unwrap_or(HardCode::Stand)
    }

    /// Doubling is allowed on the first decision of a hand or anywhere in a
    /// split chain, and only once the double button has actually rendered.
    pub async fn can_double<P: Perception>(
        &self,
        last_action: Action,
        in_split_hand: bool,
        perception: &mut P,
        stop: &AtomicBool,
    ) -> bool {
        if !in_split_hand && last_action != Action::Rebet {
            return false;
        }
        let window = DOUBLE_PROBE_INTERVAL * (DOUBLE_PROBE_ATTEMPTS - 1);
        let outcome = poll_until(stop, DOUBLE_PROBE_INTERVAL, window, || {
            perception
                .check_buttons()
                .contains(ButtonName::DoubleAvailable)
                .then_some(())
        })
        .await;
        matches!(outcome, PollOutcome::Observed(()))
    }
}
