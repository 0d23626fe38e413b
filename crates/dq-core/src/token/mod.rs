//! Last-request-wins tokens for overlapping remote fetches
//!
//! Each issued request carries a monotonically increasing token. A response
//! is applied only when its token still matches the most recently issued
//! one; responses from superseded requests are discarded at apply time
//! regardless of arrival order.

/// Tracks the latest issued and latest applied token for one query kind.
#[derive(Debug, Default)]
pub struct RequestTracker {
    issued: u64,
    applied: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new request token, superseding any in-flight request.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Try to apply a response carrying `token`.
    ///
    /// Returns `true` only when the token belongs to the most recently
    /// issued request; the tracker then records it as applied. A `false`
    /// result means the response is stale and must be discarded.
    pub fn try_apply(&mut self, token: u64) -> bool {
        if token != self.issued {
            return false;
        }
        self.applied = token;
        true
    }

    /// True while the latest issued request has not yet been applied.
    pub fn in_flight(&self) -> bool {
        self.applied != self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_request_wins() {
        let mut tracker = RequestTracker::new();
        let r1 = tracker.issue();
        let r2 = tracker.issue();

        // R2 arrives first and is applied; R1 arriving late is discarded.
        assert!(tracker.try_apply(r2));
        assert!(!tracker.try_apply(r1));
    }

    #[test]
    fn test_stale_discard_keeps_applied_state() {
        let mut tracker = RequestTracker::new();
        let r1 = tracker.issue();
        let r2 = tracker.issue();
        assert!(tracker.try_apply(r2));
        assert!(!tracker.in_flight());

        // A discarded response must not flip the tracker back to loading.
        assert!(!tracker.try_apply(r1));
        assert!(!tracker.in_flight());
    }

    #[test]
    fn test_in_flight_window() {
        let mut tracker = RequestTracker::new();
        assert!(!tracker.in_flight());

        let r1 = tracker.issue();
        assert!(tracker.in_flight());

        // A newer request keeps the tracker in flight even after the old
        // response is discarded.
        let r2 = tracker.issue();
        assert!(!tracker.try_apply(r1));
        assert!(tracker.in_flight());

        assert!(tracker.try_apply(r2));
        assert!(!tracker.in_flight());
    }
}
