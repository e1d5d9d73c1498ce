use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Longest stretch a wait may sleep without looking at the stop flag
pub const CANCEL_GRANULARITY: Duration = Duration::from_millis(50);

/// Result of a bounded poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Observed(T),
    TimedOut,
    Cancelled,
}

impl<T> PollOutcome<T> {
    pub fn observed(self) -> Option<T> {
        match self {
            Self::Observed(value) => Some(value),
            Self::TimedOut | Self::Cancelled => None,
        }
    }
}

/// Sleep for `duration`, waking at least every [`CANCEL_GRANULARITY`] to
/// check `stop`. Returns `false` if the stop flag was raised.
pub async fn sleep_checked(stop: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        tokio::time::sleep((deadline - now).min(CANCEL_GRANULARITY)).await;
    }
}

/// Run `probe` every `interval` until it yields a value or `timeout`
/// elapses. The first probe happens immediately and the last one no later
/// than the deadline.
pub async fn poll_until<T, F>(
    stop: &AtomicBool,
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> PollOutcome<T>
where
    F: FnMut() -> Option<T>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe() {
            return PollOutcome::Observed(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return PollOutcome::TimedOut;
        }
        if !sleep_checked(stop, interval.min(deadline - now)).await {
            return PollOutcome::Cancelled;
        }
    }
}
