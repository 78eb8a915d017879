//! Tells a tap from a press-and-hold.
//!
//! A press arms a short deadline. Releasing before it passes is a tap and
//! leaves playback alone; once it passes the press counts as a hold.

use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_HOLD_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Released before the hold delay elapsed.
    Tap,
    /// Released after the press had turned into a hold.
    Hold,
    /// Release without a matching press.
    Stray,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Idle,
    Armed { down_at: Instant, deadline: Instant },
    Held { down_at: Instant },
}

#[derive(Debug, Clone)]
pub struct HoldTracker {
    delay: Duration,
    state: State,
}

impl HoldTracker {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: State::Idle,
        }
    }

    pub fn is_held(&self) -> bool {
        matches!(self.state, State::Held { .. })
    }

    pub fn press(&mut self, now: Instant) {
        self.state = match self.state {
            State::Idle => State::Armed {
                down_at: now,
                deadline: now + self.delay,
            },
            // A repeated press keeps the original deadline.
            other => other,
        };
    }

    pub fn release(&mut self, now: Instant) -> Release {
        let outcome = match self.state {
            State::Armed { down_at, .. } => {
                debug!(held = ?now.saturating_duration_since(down_at), "released before hold delay");
                Release::Tap
            }
            State::Held { down_at } => {
                debug!(held = ?now.saturating_duration_since(down_at), "hold released");
                Release::Hold
            }
            State::Idle => Release::Stray,
        };
        self.state = State::Idle;
        outcome
    }

    /// Returns `true` exactly once, when an armed press turns into a hold.
    pub fn handle_timeout(&mut self, now: Instant) -> bool {
        match self.state {
            State::Armed { down_at, deadline } if now >= deadline => {
                self.state = State::Held { down_at };
                true
            }
            _ => false,
        }
    }

    pub fn time_until_deadline(&self, now: Instant) -> Option<Duration> {
        match self.state {
            State::Armed { deadline, .. } => Some(deadline.saturating_duration_since(now)),
            _ => None,
        }
    }
}

impl Default for HoldTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_DELAY)
    }
}
