use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

use crate::tokens::{DealerToken, PlayerToken};

/// Last resolved action of the current hand chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    #[default]
    None,
    Hit,
    Stand,
    Double,
    Split,
    Surrender,
    Rebet,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "NONE",
            Self::Hit => "HIT",
            Self::Stand => "STAND",
            Self::Double => "DOUBLE",
            Self::Split => "SPLIT",
            Self::Surrender => "SURRENDER",
            Self::Rebet => "REBET",
        };
        f.write_str(label)
    }
}

/// Coarse phase of the table, derived each tick from the visible buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    WaitingForRebet,
    WaitingForCardChange,
    HandComplete,
    ActiveGame,
}

/// Identity of the hand currently on the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandMarker {
    /// A bet was placed and no cards have been read yet.
    AwaitingDeal,
    Seen {
        player: PlayerToken,
        dealer: DealerToken,
    },
}

/// Pending wait for the player value to move off `previous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardChangeWait {
    pub previous: PlayerToken,
    pub deadline: Instant,
}

/// Key under which a dealer read stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DealerCacheKey {
    pub last_action: Action,
    pub bets_placed: u32,
}

#[derive(Debug, Clone)]
struct DealerCache {
    key: DealerCacheKey,
    value: DealerToken,
}

/// Mutable record of the in-progress hand and split chain.
///
/// Owned by the control loop. The cached dealer read is dropped every time
/// the hand marker is invalidated, so a stale upcard never outlives the hand
/// it was read for.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub last_action: Action,
    pub in_split_hand: bool,
    pub hand_complete_printed: bool,
    pub last_player_value: Option<PlayerToken>,
    current_hand: Option<HandMarker>,
    card_change: Option<CardChangeWait>,
    dealer_cache: Option<DealerCache>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline for a freshly placed bet.
    pub fn reset_for_new_hand(&mut self) {
        self.last_action = Action::Rebet;
        self.in_split_hand = false;
        self.last_player_value = None;
        self.card_change = None;
        self.dealer_cache = None;
        self.current_hand = Some(HandMarker::AwaitingDeal);
    }

    pub fn current_hand(&self) -> Option<&HandMarker> {
        self.current_hand.as_ref()
    }

    /// Record the (player, dealer) pairing seen this tick. A different
    /// pairing replacing a seen one drops the cached upcard; returns `true`
    /// when that happened.
    pub fn observe_hand(&mut self, marker: HandMarker) -> bool {
        let replaced = matches!(
            &self.current_hand,
            Some(seen @ HandMarker::Seen { .. }) if *seen != marker
        );
        if replaced {
            self.dealer_cache = None;
        }
        self.current_hand = Some(marker);
        replaced
    }

    /// Forget the current hand identity so the next read counts as new.
    pub fn invalidate_hand(&mut self) {
        self.current_hand = None;
        self.dealer_cache = None;
    }

    pub fn is_waiting_for_change(&self) -> bool {
        self.card_change.is_some()
    }

    pub fn card_change(&self) -> Option<&CardChangeWait> {
        self.card_change.as_ref()
    }

    pub fn arm_card_change(&mut self, previous: PlayerToken, deadline: Instant) {
        self.last_player_value = Some(previous);
        self.card_change = Some(CardChangeWait { previous, deadline });
    }

    /// Stop waiting and drop the comparison value.
    pub fn clear_card_change(&mut self) {
        self.card_change = None;
        self.last_player_value = None;
    }

    pub fn dealer_cache_key(&self, bets_placed: u32) -> DealerCacheKey {
        DealerCacheKey {
            last_action: self.last_action,
            bets_placed,
        }
    }

    /// Cached upcard, only if it was stored under `key`.
    pub fn cached_dealer(&self, key: DealerCacheKey) -> Option<DealerToken> {
        self.dealer_cache
            .as_ref()
            .filter(|cache| cache.key == key)
            .map(|cache| cache.value)
    }

    /// Last upcard read for this hand regardless of key.
    pub fn previous_dealer(&self) -> Option<DealerToken> {
        self.dealer_cache.as_ref().map(|cache| cache.value)
    }

    pub fn cache_dealer(&mut self, key: DealerCacheKey, value: DealerToken) {
        self.dealer_cache = Some(DealerCache { key, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key(action: Action, bets: u32) -> DealerCacheKey {
        DealerCacheKey {
            last_action: action,
            bets_placed: bets,
        }
    }

    #[test]
    fn test_reset_for_new_hand() {
        let mut state = SessionState::new();
        state.in_split_hand = true;
        state.last_action = Action::Split;
        state.cache_dealer(key(Action::Split, 3), DealerToken::Pip(9));

        state.reset_for_new_hand();
        assert_eq!(state.last_action, Action::Rebet);
        assert!(!state.in_split_hand);
        assert!(state.previous_dealer().is_none());
        assert_eq!(state.current_hand(), Some(&HandMarker::AwaitingDeal));
    }

    #[test]
    fn test_dealer_cache_is_keyed() {
        let mut state = SessionState::new();
        state.cache_dealer(key(Action::Rebet, 1), DealerToken::Pip(6));
        assert_eq!(state.cached_dealer(key(Action::Rebet, 1)), Some(DealerToken::Pip(6)));
        assert_eq!(state.cached_dealer(key(Action::Rebet, 2)), None);
        assert_eq!(state.cached_dealer(key(Action::Hit, 1)), None);
        assert_eq!(state.previous_dealer(), Some(DealerToken::Pip(6)));
    }

    #[test]
    fn test_invalidate_hand_drops_cache() {
        let mut state = SessionState::new();
        state.observe_hand(HandMarker::Seen {
            player: PlayerToken::Hard(12),
            dealer: DealerToken::Pip(6),
        });
        state.cache_dealer(key(Action::Rebet, 1), DealerToken::Pip(6));

        state.invalidate_hand();
        assert!(state.current_hand().is_none());
        assert!(state.cached_dealer(key(Action::Rebet, 1)).is_none());
    }

    #[test]
    fn test_new_pairing_drops_cache() {
        let mut state = SessionState::new();
        state.last_action = Action::Split;
        let first = HandMarker::Seen {
            player: PlayerToken::Hard(18),
            dealer: DealerToken::Pip(9),
        };
        assert!(!state.observe_hand(first.clone()));
        state.cache_dealer(key(Action::Split, 2), DealerToken::Pip(9));

        // Same pairing again keeps the cache
        assert!(!state.observe_hand(first));
        assert_eq!(state.cached_dealer(key(Action::Split, 2)), Some(DealerToken::Pip(9)));

        // Next sub-hand under an unchanged key must not reuse the upcard
        let next = HandMarker::Seen {
            player: PlayerToken::Hard(13),
            dealer: DealerToken::Pip(9),
        };
        assert!(state.observe_hand(next));
        assert!(state.cached_dealer(key(Action::Split, 2)).is_none());
        assert!(state.previous_dealer().is_none());
    }

    #[test]
    fn test_first_pairing_after_deal_keeps_cache() {
        let mut state = SessionState::new();
        state.reset_for_new_hand();
        state.cache_dealer(key(Action::Rebet, 1), DealerToken::Ace);
        assert!(!state.observe_hand(HandMarker::Seen {
            player: PlayerToken::Soft { low: 2 },
            dealer: DealerToken::Ace,
        }));
        assert_eq!(state.cached_dealer(key(Action::Rebet, 1)), Some(DealerToken::Ace));
    }

    #[tokio::test(start_paused = true)]
    async fn test_card_change_wait() {
        let mut state = SessionState::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        state.arm_card_change(PlayerToken::Hard(12), deadline);
        assert!(state.is_waiting_for_change());
        assert_eq!(state.last_player_value, Some(PlayerToken::Hard(12)));

        state.clear_card_change();
        assert!(!state.is_waiting_for_change());
        assert!(state.last_player_value.is_none());
    }
}
