//! Observation tokens and the mutable per-session records of the pilot.

pub mod session;
pub mod stats;
pub mod tokens;

pub use session::{Action, CardChangeWait, DealerCacheKey, GamePhase, HandMarker, SessionState};
pub use stats::{Statistics, StatsReport};
pub use tokens::{DealerToken, PlayerToken, SpecificCard, TokenError, SOFT_SEPARATOR};
