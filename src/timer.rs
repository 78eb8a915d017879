//! Single-shot countdown that can be frozen and continued.
//!
//! The timer never sleeps on its own. Callers pass the current [`Instant`] to
//! every operation and ask [`PausableTimer::poll`] whether the callback is due,
//! which keeps it usable from an async loop and from plain unit tests alike.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Fired,
}

/// Identifies one arming of a [`PausableTimer`]; stale handles cancel nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
pub struct PausableTimer<T> {
    state: TimerState,
    callback: Option<T>,
    duration: Duration,
    remaining: Duration,
    started_at: Option<Instant>,
    generation: u64,
}

impl<T> Default for PausableTimer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PausableTimer<T> {
    pub const fn new() -> Self {
        Self {
            state: TimerState::Idle,
            callback: None,
            duration: Duration::ZERO,
            remaining: Duration::ZERO,
            started_at: None,
            generation: 0,
        }
    }

    pub const fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    /// Full length of the most recent [`start`](Self::start).
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Schedule `callback` to fire `duration` after `now`, replacing whatever
    /// was pending before.
    pub fn start(&mut self, callback: T, duration: Duration, now: Instant) -> TimerHandle {
        self.callback = Some(callback);
        self.duration = duration;
        self.remaining = duration;
        self.arm(now)
    }

    /// Cancel the pending callback. Recorded remaining time is kept.
    pub fn clear(&mut self) {
        self.state = TimerState::Idle;
    }

    /// Clear only if `handle` still names the current arming.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let live = matches!(self.state, TimerState::Running | TimerState::Paused);
        if handle.0 != self.generation || !live {
            return false;
        }
        self.clear();
        true
    }

    /// Freeze the countdown. Elapsed time is charged against the remaining
    /// time, which never drops below zero. Does nothing unless running.
    pub fn pause(&mut self, now: Instant) {
        if self.state != TimerState::Running {
            return;
        }
        let elapsed = self
            .started_at
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or_default();
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.state = TimerState::Paused;
    }

    /// Re-arm the stored callback with the stored remaining time.
    ///
    /// When the timer is not paused this restarts the same callback with the
    /// last recorded remaining time. Returns `None` if nothing was ever
    /// started.
    pub fn resume(&mut self, now: Instant) -> Option<TimerHandle> {
        self.callback.as_ref()?;
        Some(self.arm(now))
    }

    /// Time left before the callback is due, as of `now`.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.state {
            TimerState::Running => self.time_until_deadline(now).unwrap_or_default(),
            TimerState::Fired => Duration::ZERO,
            TimerState::Idle | TimerState::Paused => self.remaining,
        }
    }

    pub fn time_until_deadline(&self, now: Instant) -> Option<Duration> {
        self.deadline().map(|at| at.saturating_duration_since(now))
    }

    /// Completed fraction of the current countdown in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f32 {
        match self.state {
            TimerState::Idle => 0.0,
            TimerState::Fired => 1.0,
            TimerState::Running | TimerState::Paused => {
                if self.duration.is_zero() {
                    return 1.0;
                }
                let left = self.remaining(now).as_secs_f32() / self.duration.as_secs_f32();
                (1.0 - left).clamp(0.0, 1.0)
            }
        }
    }

    fn arm(&mut self, now: Instant) -> TimerHandle {
        self.generation = self.generation.wrapping_add(1);
        self.started_at = Some(now);
        self.state = TimerState::Running;
        TimerHandle(self.generation)
    }

    fn deadline(&self) -> Option<Instant> {
        match (self.state, self.started_at) {
            (TimerState::Running, Some(at)) => Some(at + self.remaining),
            _ => None,
        }
    }
}

impl<T: Clone> PausableTimer<T> {
    /// Deliver the callback once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.state = TimerState::Fired;
        self.callback.clone()
    }
}
