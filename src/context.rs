use anyhow::{Context as _, Result};
use tracing::debug;

use bj_capture::{sleep_checked, ButtonName, Clicker, Perception, ScreenRect};
use bj_state::{SessionState, Statistics};

use crate::config::ms;
use crate::control::ControlHandle;

/// Everything one pilot tick reads and mutates, passed explicitly to the
/// executor and the loop.
pub struct Context<P, C> {
    pub perception: P,
    pub clicker: C,
    pub session: SessionState,
    pub stats: Statistics,
    pub control: ControlHandle,
}

impl<P: Perception, C: Clicker> Context<P, C> {
    pub fn new(perception: P, clicker: C, control: ControlHandle) -> Self {
        Self {
            perception,
            clicker,
            session: SessionState::new(),
            stats: Statistics::new(),
            control,
        }
    }

    /// Sleep `millis`, returning `false` if exit was requested meanwhile
    pub async fn settle(&self, millis: u64) -> bool {
        sleep_checked(self.control.exit_flag(), ms(millis)).await
    }

    pub fn click(&mut self, button: ButtonName, rect: ScreenRect) -> Result<()> {
        debug!("Clicking {} at {:?}", button, rect.center());
        self.clicker
            .click(rect)
            .with_context(|| format!("Failed to click {}", button))
    }
}
