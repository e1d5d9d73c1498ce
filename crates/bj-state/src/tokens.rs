use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the low and high reading of a soft total ("2_12").
pub const SOFT_SEPARATOR: char = '_';

/// Errors produced when a raw perception string is not a valid token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("empty token")]
    Empty,
    #[error("not a number: '{0}'")]
    NotANumber(String),
    #[error("player total out of range: '{0}'")]
    PlayerOutOfRange(String),
    #[error("soft total '{0}' is not a low/low+10 pair")]
    MalformedSoft(String),
    #[error("dealer upcard out of range: '{0}'")]
    DealerOutOfRange(String),
    #[error("unknown specific card: '{0}'")]
    UnknownCard(String),
}

/// Player hand value as read off the table.
///
/// Hard totals render as a bare integer ("4".."20", or up to "31" once a hit
/// makes 21 or busts); soft totals render as `low_high` where
/// `high == low + 10` ("2_12").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlayerToken {
    Hard(u8),
    Soft { low: u8 },
}

impl PlayerToken {
    pub const MIN_HARD: u8 = 4;
    /// Totals past 21 are busts but still readable, so the post-hit change is seen
    pub const MAX_HARD: u8 = 31;

    pub fn hard(total: u8) -> Result<Self, TokenError> {
        if (Self::MIN_HARD..=Self::MAX_HARD).contains(&total) {
            Ok(Self::Hard(total))
        } else {
            Err(TokenError::PlayerOutOfRange(total.to_string()))
        }
    }

    pub fn soft(low: u8) -> Result<Self, TokenError> {
        if (1..=10).contains(&low) {
            Ok(Self::Soft { low })
        } else {
            Err(TokenError::MalformedSoft(format!("{}_{}", low, low + 10)))
        }
    }

    /// True when the token carries the ambiguous-total separator.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::Soft { .. })
    }
}

impl fmt::Display for PlayerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hard(total) => write!(f, "{}", total),
            Self::Soft { low } => write!(f, "{}{}{}", low, SOFT_SEPARATOR, low + 10),
        }
    }
}

impl FromStr for PlayerToken {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = normalize(raw);
        if text.is_empty() {
            return Err(TokenError::Empty);
        }

        match text.split_once(SOFT_SEPARATOR) {
            Some((low, high)) => {
                let low_n = parse_number(low, &text)?;
                let high_n = parse_number(high, &text)?;
                if high_n != low_n.saturating_add(10) {
                    return Err(TokenError::MalformedSoft(text));
                }
                Self::soft(low_n).map_err(|_| TokenError::MalformedSoft(text))
            }
            None => {
                let total = parse_number(&text, &text)?;
                Self::hard(total).map_err(|_| TokenError::PlayerOutOfRange(text))
            }
        }
    }
}

impl TryFrom<String> for PlayerToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlayerToken> for String {
    fn from(value: PlayerToken) -> Self {
        value.to_string()
    }
}

/// Dealer upcard. Aces render as "1_11".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DealerToken {
    Pip(u8),
    Ace,
}

impl DealerToken {
    /// Every upcard in table column order.
    pub fn all() -> impl Iterator<Item = DealerToken> {
        (2..=10).map(DealerToken::Pip).chain(std::iter::once(DealerToken::Ace))
    }
}

impl fmt::Display for DealerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pip(value) => write!(f, "{}", value),
            Self::Ace => write!(f, "1{}11", SOFT_SEPARATOR),
        }
    }
}

impl FromStr for DealerToken {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = normalize(raw);
        match text.as_str() {
            "" => Err(TokenError::Empty),
            // A lone ace is read as its high value by some perception modes
            "1_11" | "11" => Ok(Self::Ace),
            _ => {
                let value = parse_number(&text, &text)
                    .map_err(|_| TokenError::DealerOutOfRange(text.clone()))?;
                if (2..=10).contains(&value) {
                    Ok(Self::Pip(value))
                } else {
                    Err(TokenError::DealerOutOfRange(text))
                }
            }
        }
    }
}

impl TryFrom<String> for DealerToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DealerToken> for String {
    fn from(value: DealerToken) -> Self {
        value.to_string()
    }
}

/// Rank of the site-specific "specific card" region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpecificCard {
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl SpecificCard {
    pub fn is_seven_or_eight(&self) -> bool {
        matches!(self, Self::Seven | Self::Eight)
    }
}

impl fmt::Display for SpecificCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
        };
        f.write_str(label)
    }
}

impl FromStr for SpecificCard {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "" => Err(TokenError::Empty),
            "5" => Ok(Self::Five),
            "6" => Ok(Self::Six),
            "7" => Ok(Self::Seven),
            "8" => Ok(Self::Eight),
            "9" => Ok(Self::Nine),
            "10" => Ok(Self::Ten),
            "J" => Ok(Self::Jack),
            "Q" => Ok(Self::Queen),
            "K" => Ok(Self::King),
            other => Err(TokenError::UnknownCard(other.to_string())),
        }
    }
}

impl TryFrom<String> for SpecificCard {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpecificCard> for String {
    fn from(value: SpecificCard) -> Self {
        value.to_string()
    }
}

/// Trim, upper-case and fold "/" into the soft separator.
fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase().replace('/', "_")
}

fn parse_number(part: &str, whole: &str) -> Result<u8, TokenError> {
    part.parse::<u8>()
        .map_err(|_| TokenError::NotANumber(whole.to_string()))
}
