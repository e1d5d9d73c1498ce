//! Recorded-session playback.
//!
//! A replay file is a JSON list of frames, each describing what the table
//! showed at one point of a session. Reads return the current frame and a
//! click on one of its buttons advances to the next, so the whole pilot can
//! run offline against a recording.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use bj_state::{DealerToken, PlayerToken, SpecificCard};

use crate::{ButtonName, ButtonSet, Clicker, Perception, ScreenRect};

/// One recorded table state. Values are the raw perception text and are
/// parsed on every read, so malformed entries behave like a failed read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayFrame {
    #[serde(default)]
    pub buttons: ButtonSet,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub dealer: Option<String>,
    #[serde(default)]
    pub specific: Option<String>,
}

/// A click received by the replay table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayClick {
    pub frame: usize,
    pub rect: ScreenRect,
    /// `None` when nothing was drawn at `rect` (a misclick)
    pub button: Option<ButtonName>,
}

#[derive(Debug, Default)]
struct ReplayInner {
    frames: Vec<ReplayFrame>,
    cursor: usize,
    clicks: Vec<ReplayClick>,
}

impl ReplayInner {
    fn current(&self) -> Option<&ReplayFrame> {
        self.frames.get(self.cursor)
    }
}

/// Plays back recorded frames. Clones share the same cursor, so one clone
/// can serve as [`Perception`] and another as [`Clicker`].
#[derive(Debug, Clone, Default)]
pub struct ReplayTable {
    inner: Arc<Mutex<ReplayInner>>,
}

impl ReplayTable {
    pub fn new(frames: Vec<ReplayFrame>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ReplayInner {
                frames,
                ..Default::default()
            })),
        }
    }

    /// Load a replay file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay {}", path.display()))?;
        let frames: Vec<ReplayFrame> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse replay {}", path.display()))?;
        info!("Loaded replay {} ({} frames)", path.display(), frames.len());
        Ok(Self::new(frames))
    }

    fn lock(&self) -> MutexGuard<'_, ReplayInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    /// True once the last frame has been clicked through
    pub fn is_exhausted(&self) -> bool {
        let inner = self.lock();
        inner.cursor >= inner.frames.len()
    }

    pub fn clicks(&self) -> Vec<ReplayClick> {
        self.lock().clicks.clone()
    }

    /// Names of the buttons clicked so far, misclicks excluded
    pub fn clicked_buttons(&self) -> Vec<ButtonName> {
        self.lock().clicks.iter().filter_map(|c| c.button).collect()
    }
}

impl Perception for ReplayTable {
    fn read_player_value(&mut self) -> Option<PlayerToken> {
        let inner = self.lock();
        let raw = inner.current()?.player.as_deref()?;
        raw.parse::<PlayerToken>()
            .map_err(|e| debug!("Unreadable player value: {}", e))
            .ok()
    }

    fn read_dealer_value(&mut self, cached: Option<DealerToken>) -> Option<DealerToken> {
        let inner = self.lock();
        let fresh = inner
            .current()
            .and_then(|frame| frame.dealer.as_deref())
            .and_then(|raw| {
                raw.parse::<DealerToken>()
                    .map_err(|e| debug!("Unreadable dealer value: {}", e))
                    .ok()
            });
        fresh.or(cached)
    }

    fn read_specific_card(&mut self) -> Option<SpecificCard> {
        let inner = self.lock();
        let raw = inner.current()?.specific.as_deref()?;
        raw.parse::<SpecificCard>()
            .map_err(|e| debug!("Unreadable specific card: {}", e))
            .ok()
    }

    fn check_buttons(&mut self) -> ButtonSet {
        self.lock()
            .current()
            .map(|frame| frame.buttons.clone())
            .unwrap_or_default()
    }
}

impl Clicker for ReplayTable {
    fn click(&mut self, rect: ScreenRect) -> Result<()> {
        let mut inner = self.lock();
        let frame = inner.cursor;
        let button = inner.current().and_then(|f| f.buttons.name_at(rect));
        inner.clicks.push(ReplayClick {
            frame,
            rect,
            button,
        });

        match button {
            Some(name) => {
                debug!("Replay frame {}: clicked {}", frame, name);
                inner.cursor += 1;
            }
            None => warn!("Replay frame {}: misclick at {:?}", frame, rect.center()),
        }
        Ok(())
    }
}
