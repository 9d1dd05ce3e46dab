//! Sliding-window rate limiter for citizen write actions.
//!
//! Keyed by (user, action); each allowed request records an instant and
//! requests older than the window are pruned on the next check. State is
//! process-local, which matches the store: both reset together.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rate-limited action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateAction {
    /// Report submission.
    SubmitReport,
    /// Comment creation.
    Comment,
}

/// Process-local sliding-window limiter.
pub struct RateLimiter {
    window: Duration,
    requests: Mutex<HashMap<(i64, RateAction), Vec<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Creates a limiter with the standard one-hour window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(60 * 60))
    }

    /// Creates a limiter with a custom window (used by tests).
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Records and allows the request unless the user already spent
    /// `max_requests` within the window.
    pub fn is_allowed(&self, user_id: i64, action: RateAction, max_requests: u32) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());

        let timestamps = requests.entry((user_id, action)).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= max_requests as usize {
            return false;
        }

        timestamps.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_cap() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.is_allowed(1, RateAction::SubmitReport, 3));
        }
        assert!(!limiter.is_allowed(1, RateAction::SubmitReport, 3));
    }

    #[test]
    fn users_and_actions_are_independent() {
        let limiter = RateLimiter::new();
        assert!(limiter.is_allowed(1, RateAction::SubmitReport, 1));
        assert!(!limiter.is_allowed(1, RateAction::SubmitReport, 1));
        assert!(limiter.is_allowed(1, RateAction::Comment, 1));
        assert!(limiter.is_allowed(2, RateAction::SubmitReport, 1));
    }

    #[test]
    fn window_expiry_frees_the_budget() {
        let limiter = RateLimiter::with_window(Duration::from_millis(10));
        assert!(limiter.is_allowed(1, RateAction::Comment, 1));
        assert!(!limiter.is_allowed(1, RateAction::Comment, 1));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.is_allowed(1, RateAction::Comment, 1));
    }
}
