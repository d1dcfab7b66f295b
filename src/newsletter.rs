//! Newsletter sign-up widget: `idle -> subscribing -> subscribed -> idle`.
//! Nothing is sent anywhere; the delays only mimic a round trip.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Simulated time spent "sending" the subscription
pub const SUBSCRIBE_DELAY: Duration = Duration::from_millis(1500);
/// How long the confirmation stays up
pub const CONFIRMATION_DISPLAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsletterState {
    Idle,
    Subscribing { since: Instant },
    Subscribed { since: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsletterStatus {
    Idle,
    Subscribing,
    Subscribed,
}

#[derive(Debug, Clone)]
pub struct Newsletter {
    state: NewsletterState,
}

impl Newsletter {
    pub fn new() -> Self {
        Self {
            state: NewsletterState::Idle,
        }
    }

    pub fn status(&self) -> NewsletterStatus {
        match self.state {
            NewsletterState::Idle => NewsletterStatus::Idle,
            NewsletterState::Subscribing { .. } => NewsletterStatus::Subscribing,
            NewsletterState::Subscribed { .. } => NewsletterStatus::Subscribed,
        }
    }

    /// Start a subscription. Returns false while one is already in progress
    /// or being confirmed.
    pub fn subscribe(&mut self, now: Instant) -> bool {
        if self.state != NewsletterState::Idle {
            return false;
        }
        self.state = NewsletterState::Subscribing { since: now };
        true
    }

    /// Whether `advance(now)` would change anything
    pub fn is_due(&self, now: Instant) -> bool {
        match self.state {
            NewsletterState::Idle => false,
            NewsletterState::Subscribing { since } => now >= since + SUBSCRIBE_DELAY,
            NewsletterState::Subscribed { since } => now >= since + CONFIRMATION_DISPLAY,
        }
    }

    /// Apply every transition that is due at `now`
    pub fn advance(&mut self, now: Instant) {
        loop {
            self.state = match self.state {
                NewsletterState::Subscribing { since } if now >= since + SUBSCRIBE_DELAY => {
                    NewsletterState::Subscribed {
                        since: since + SUBSCRIBE_DELAY,
                    }
                }
                NewsletterState::Subscribed { since } if now >= since + CONFIRMATION_DISPLAY => {
                    NewsletterState::Idle
                }
                _ => return,
            };
        }
    }
}

impl Default for Newsletter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_cycle() {
        let mut widget = Newsletter::new();
        let t0 = Instant::now();

        assert!(widget.subscribe(t0));
        assert!(!widget.subscribe(t0));
        assert_eq!(widget.status(), NewsletterStatus::Subscribing);

        assert!(!widget.is_due(t0 + Duration::from_secs(1)));
        widget.advance(t0 + Duration::from_secs(1));
        assert_eq!(widget.status(), NewsletterStatus::Subscribing);

        assert!(widget.is_due(t0 + SUBSCRIBE_DELAY));

        widget.advance(t0 + SUBSCRIBE_DELAY);
        assert_eq!(widget.status(), NewsletterStatus::Subscribed);
        assert!(!widget.subscribe(t0 + SUBSCRIBE_DELAY));

        widget.advance(t0 + SUBSCRIBE_DELAY + CONFIRMATION_DISPLAY);
        assert_eq!(widget.status(), NewsletterStatus::Idle);
    }

    #[test]
    fn test_advance_skips_through_both_phases() {
        let mut widget = Newsletter::new();
        let t0 = Instant::now();
        widget.subscribe(t0);
        widget.advance(t0 + Duration::from_secs(60));
        assert_eq!(widget.status(), NewsletterStatus::Idle);
    }
}
