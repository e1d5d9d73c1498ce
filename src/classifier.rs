use bj_capture::{ButtonName, ButtonSet};
use bj_state::{GamePhase, SessionState};

/// Map the visible buttons and session flags to a phase. First match wins.
pub fn classify(buttons: &ButtonSet, session: &SessionState) -> GamePhase {
    let in_active_game = buttons.any_gameplay();

    if buttons.contains(ButtonName::RebetDealAvailable) && !in_active_game {
        return GamePhase::WaitingForRebet;
    }
    if session.is_waiting_for_change() {
        return GamePhase::WaitingForCardChange;
    }
    if buttons.contains(ButtonName::RebetDealUnavailable) && !in_active_game {
        return GamePhase::HandComplete;
    }
    if in_active_game {
        return GamePhase::ActiveGame;
    }
    GamePhase::HandComplete
}

#[cfg(test)]
mod tests {
    use super::*;
    use bj_capture::ScreenRect;
    use bj_state::PlayerToken;
    use tokio::time::Instant;

    fn set(names: &[ButtonName]) -> ButtonSet {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, ScreenRect::new(i as i32 * 50, 0, i as i32 * 50 + 40, 30)))
            .collect()
    }

    fn waiting() -> SessionState {
        let mut session = SessionState::new();
        session.arm_card_change(PlayerToken::Hard(12), Instant::now());
        session
    }

    #[test]
    fn test_rebet_wins_over_card_change() {
        let buttons = set(&[ButtonName::RebetDealAvailable]);
        assert_eq!(classify(&buttons, &waiting()), GamePhase::WaitingForRebet);
    }

    #[test]
    fn test_rebet_ignored_while_gameplay_visible() {
        let buttons = set(&[ButtonName::RebetDealAvailable, ButtonName::HitAvailable]);
        assert_eq!(classify(&buttons, &SessionState::new()), GamePhase::ActiveGame);
    }

    #[test]
    fn test_card_change_wins_over_gameplay() {
        let buttons = set(&[ButtonName::HitAvailable, ButtonName::StandAvailable]);
        assert_eq!(classify(&buttons, &waiting()), GamePhase::WaitingForCardChange);
    }

    #[test]
    fn test_idle_and_fallback() {
        let session = SessionState::new();
        let idle = set(&[ButtonName::RebetDealUnavailable]);
        assert_eq!(classify(&idle, &session), GamePhase::HandComplete);
        assert_eq!(classify(&ButtonSet::new(), &session), GamePhase::HandComplete);
    }

    #[test]
    fn test_every_gameplay_button_is_active() {
        for name in ButtonName::GAMEPLAY {
            assert_eq!(classify(&set(&[name]), &SessionState::new()), GamePhase::ActiveGame);
        }
    }

    #[test]
    fn test_idempotent() {
        let session = SessionState::new();
        let buttons = set(&[ButtonName::HitAvailable, ButtonName::DoubleAvailable]);
        let first = classify(&buttons, &session);
        for _ in 0..10 {
            assert_eq!(classify(&buttons, &session), first);
        }
    }
}
