//! Debouncing rapid text input
//!
//! Typing into the search or a filter box fires a transition per
//! keystroke. Wrapping the transition in [`Debouncer::ready`] lets only
//! the final keystroke of a burst through, cutting redundant in-flight
//! requests. This is purely a load optimization: correctness is already
//! guaranteed by the last-request-wins token discipline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Generation-counted debouncer.
///
/// Each `ready` call supersedes the previous one; only the call still
/// current after the delay reports `true`.
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    /// Typical delay for keystroke input.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait out the delay; `true` when no newer call superseded this one.
    pub async fn ready(&self) -> bool {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == mine
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}
