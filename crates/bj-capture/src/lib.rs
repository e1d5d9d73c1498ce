use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use bj_state::{DealerToken, PlayerToken, SpecificCard};

pub mod poll;
pub mod replay;

pub use poll::{poll_until, sleep_checked, PollOutcome};
pub use replay::{ReplayClick, ReplayFrame, ReplayTable};

/// Screen rectangle of a detected button, in absolute pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Click target: the midpoint of the rectangle
    pub fn center(&self) -> (i32, i32) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }
}

/// Buttons the perception layer knows how to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonName {
    HitAvailable,
    StandAvailable,
    DoubleAvailable,
    SplitAvailable,
    SurrenderAvailable,
    RebetDealAvailable,
    RebetDealUnavailable,
}

impl ButtonName {
    /// Buttons that only show while a hand is being played
    pub const GAMEPLAY: [ButtonName; 5] = [
        ButtonName::HitAvailable,
        ButtonName::StandAvailable,
        ButtonName::DoubleAvailable,
        ButtonName::SplitAvailable,
        ButtonName::SurrenderAvailable,
    ];

    pub fn is_gameplay(&self) -> bool {
        Self::GAMEPLAY.contains(self)
    }
}

impl fmt::Display for ButtonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Visible buttons and where they are
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonSet(HashMap<ButtonName, ScreenRect>);

impl ButtonSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: ButtonName, rect: ScreenRect) -> Self {
        self.insert(name, rect);
        self
    }

    pub fn insert(&mut self, name: ButtonName, rect: ScreenRect) {
        self.0.insert(name, rect);
    }

    pub fn get(&self, name: ButtonName) -> Option<ScreenRect> {
        self.0.get(&name).copied()
    }

    pub fn contains(&self, name: ButtonName) -> bool {
        self.0.contains_key(&name)
    }

    /// True when any hit/stand/double/split/surrender button is visible
    pub fn any_gameplay(&self) -> bool {
        self.0.keys().any(ButtonName::is_gameplay)
    }

    /// Name of the button drawn at `rect`, if any
    pub fn name_at(&self, rect: ScreenRect) -> Option<ButtonName> {
        self.0
            .iter()
            .find(|(_, r)| **r == rect)
            .map(|(name, _)| *name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(ButtonName, ScreenRect)> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = (ButtonName, ScreenRect)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Read side of the table: everything the pilot can observe.
///
/// Reads are best-effort. `None` means the value could not be read this
/// time and the caller should retry on a later tick.
pub trait Perception {
    fn read_player_value(&mut self) -> Option<PlayerToken>;

    /// Read the dealer upcard. `cached` is the last upcard read for this
    /// hand; implementations may fall back to it when a fresh read fails.
    fn read_dealer_value(&mut self, cached: Option<DealerToken>) -> Option<DealerToken>;

    fn read_specific_card(&mut self) -> Option<SpecificCard>;

    fn check_buttons(&mut self) -> ButtonSet;
}

/// Write side of the table
pub trait Clicker {
    fn click(&mut self, rect: ScreenRect) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center() {
        let rect = ScreenRect::new(100, 200, 140, 230);
        assert_eq!(rect.center(), (120, 215));
    }

    #[test]
    fn test_button_set() {
        let hit = ScreenRect::new(0, 0, 10, 10);
        let rebet = ScreenRect::new(20, 0, 30, 10);
        let idle = ButtonSet::new().with(ButtonName::RebetDealAvailable, rebet);
        assert!(!idle.any_gameplay());
        assert_eq!(idle.name_at(rebet), Some(ButtonName::RebetDealAvailable));

        let active = idle.clone().with(ButtonName::HitAvailable, hit);
        assert!(active.any_gameplay());
        assert_eq!(active.get(ButtonName::HitAvailable), Some(hit));
        assert_eq!(active.len(), 2);
        assert!(active.name_at(ScreenRect::new(1, 1, 1, 1)).is_none());
    }

    #[test]
    fn test_button_set_json() {
        let json = r#"{ "HitAvailable": { "left": 1, "top": 2, "right": 3, "bottom": 4 } }"#;
        let set: ButtonSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.get(ButtonName::HitAvailable), Some(ScreenRect::new(1, 2, 3, 4)));
        assert!(serde_json::from_str::<ButtonSet>(r#"{ "Insurance": {} }"#).is_err());
    }
}
