use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Arm/disarm and exit flags shared between the pilot loop and whatever
/// drives it (keyboard, signals, replay watcher). The only state the loop
/// shares with another context.
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    running: Arc<AtomicBool>,
    exit: Arc<AtomicBool>,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip running/paused and return the new state
    pub fn toggle(&self) -> bool {
        !self.running.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn arm(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn request_exit(&self) {
        self.exit.store(true, Ordering::SeqCst);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit.load(Ordering::SeqCst)
    }

    /// Flag polled by bounded waits
    pub fn exit_flag(&self) -> &AtomicBool {
        &self.exit
    }
}
