//! Slide-advance state machine.
//!
//! [`CarouselController`] owns the current index and the paused flag. Every
//! index change goes through [`CarouselController::show`], which persists the
//! index, rewinds videos, and arms the auto-advance countdown.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::deck::{Slide, SlideDeck, SlideId};
use crate::events::{CarouselInput, CarouselView, PlaybackCommand};
use crate::playback::MediaPlayer;
use crate::press::{DEFAULT_HOLD_DELAY, HoldTracker, Release};
use crate::store::{IndexStore, LAST_INDEX_KEY, parse_index};
use crate::timer::PausableTimer;

pub const DEFAULT_IMAGE_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// How long an image stays up before advancing.
    pub image_duration: Duration,
    /// How long a press must last before it pauses the carousel.
    pub hold_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            image_duration: DEFAULT_IMAGE_DURATION,
            hold_delay: DEFAULT_HOLD_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    Advance,
}

pub struct CarouselController<S, P> {
    deck: SlideDeck,
    settings: ControllerSettings,
    index: usize,
    paused: bool,
    countdown: PausableTimer<Expiry>,
    hold: HoldTracker,
    // Set when a video slide is shown, cleared by its first "playing" event.
    awaiting_video_duration: bool,
    // Whether playback of the current video was ever requested.
    video_started: bool,
    store: S,
    player: P,
}

impl<S: IndexStore, P: MediaPlayer> CarouselController<S, P> {
    pub fn new(deck: SlideDeck, settings: ControllerSettings, store: S, player: P) -> Self {
        Self {
            deck,
            settings,
            index: 0,
            paused: false,
            countdown: PausableTimer::new(),
            hold: HoldTracker::new(settings.hold_delay),
            awaiting_video_duration: false,
            video_started: false,
            store,
            player,
        }
    }

    /// Resume at the persisted index, or at the first slide when nothing
    /// usable was stored.
    pub fn initialize(&mut self, now: Instant) {
        let raw = match self.store.load(LAST_INDEX_KEY) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("failed to read persisted index: {err:#}");
                None
            }
        };
        let index = match parse_index(raw.as_deref(), self.deck.len()) {
            Some(index) => index,
            None => {
                if let Some(raw) = raw {
                    debug!(%raw, "ignoring unusable persisted index");
                }
                0
            }
        };
        info!(index, slides = self.deck.len(), "carousel initialized");
        self.show(index, now);
    }

    /// Make `index` the current slide. Out-of-range indices are ignored.
    pub fn show(&mut self, index: usize, now: Instant) -> bool {
        let Some(slide) = self.deck.get(index).cloned() else {
            debug!(index, "ignoring out-of-range slide");
            return false;
        };
        if index != self.index {
            if let Some(previous) = self.deck.get(self.index).filter(|s| s.is_video()) {
                self.player.send(PlaybackCommand::Pause(previous.clone()));
            }
        }
        self.index = index;
        if let Err(err) = self.store.save(LAST_INDEX_KEY, &index.to_string()) {
            warn!(index, "failed to persist slide index: {err:#}");
        }
        debug!(index, slide = %slide.id, kind = ?slide.kind, "showing slide");
        if slide.is_video() {
            self.player.send(PlaybackCommand::Reset(slide.clone()));
        }
        self.schedule_auto_advance(&slide, now);
        true
    }

    pub fn next(&mut self, now: Instant) -> bool {
        if self.paused || self.index >= self.deck.last_index() {
            return false;
        }
        self.show(self.index + 1, now)
    }

    pub fn previous(&mut self, now: Instant) -> bool {
        if self.paused || self.index == 0 {
            return false;
        }
        self.show(self.index - 1, now)
    }

    /// Start the hold delay. Releasing before it passes leaves playback alone.
    pub fn begin_press_hold(&mut self, now: Instant) {
        self.hold.press(now);
    }

    pub fn end_press_hold(&mut self, now: Instant) {
        if self.hold.release(now) == Release::Tap {
            debug!("press released before hold delay; nothing paused");
        }
        if self.paused {
            self.leave_paused(now);
        }
    }

    /// Arm the countdown with the video's own length once it starts playing.
    ///
    /// Only the first "playing" event after the slide was shown counts;
    /// replays and events for other slides are ignored.
    pub fn video_playing(
        &mut self,
        id: &SlideId,
        natural_duration: Option<Duration>,
        now: Instant,
    ) {
        if self.current_slide().id != *id {
            debug!(slide = %id, "ignoring playback event for inactive slide");
            return;
        }
        if !self.awaiting_video_duration {
            debug!(slide = %id, "video replay; countdown unchanged");
            return;
        }
        self.awaiting_video_duration = false;
        let duration = match natural_duration.filter(|d| !d.is_zero()) {
            Some(duration) => duration,
            None => {
                warn!(slide = %id, "video reported no usable duration; using image duration");
                self.settings.image_duration
            }
        };
        debug!(
            slide = %id,
            duration = %humantime::format_duration(duration),
            "video countdown armed"
        );
        self.countdown.start(Expiry::Advance, duration, now);
        if self.paused {
            self.countdown.pause(now);
        }
    }

    /// Fire whatever deadline has passed. Returns `true` if the carousel
    /// paused or moved to another slide.
    pub fn handle_timeout(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if self.hold.handle_timeout(now) {
            changed |= self.enter_paused(now);
        }
        if let Some(Expiry::Advance) = self.countdown.poll(now) {
            debug!(index = self.index, "countdown expired");
            changed |= self.next(now);
        }
        changed
    }

    /// Time until the nearest pending deadline, if any.
    pub fn time_until_deadline(&self, now: Instant) -> Option<Duration> {
        match (
            self.hold.time_until_deadline(now),
            self.countdown.time_until_deadline(now),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn handle_input(&mut self, input: CarouselInput, now: Instant) {
        match input {
            CarouselInput::Next => {
                self.next(now);
            }
            CarouselInput::Previous => {
                self.previous(now);
            }
            CarouselInput::PressStart => self.begin_press_hold(now),
            CarouselInput::PressEnd => self.end_press_hold(now),
            CarouselInput::VideoPlaying {
                id,
                natural_duration,
            } => self.video_playing(&id, natural_duration, now),
        }
    }

    pub fn view(&self, now: Instant) -> CarouselView {
        let current = self.countdown.progress(now);
        let progress = (0..self.deck.len())
            .map(|i| match i.cmp(&self.index) {
                std::cmp::Ordering::Less => 1.0,
                std::cmp::Ordering::Equal => current,
                std::cmp::Ordering::Greater => 0.0,
            })
            .collect();
        CarouselView {
            index: self.index,
            slide_count: self.deck.len(),
            paused: self.paused,
            progress,
        }
    }

    fn schedule_auto_advance(&mut self, slide: &Slide, now: Instant) {
        if slide.is_video() {
            self.countdown.clear();
            self.awaiting_video_duration = true;
            self.video_started = !self.paused;
            if self.video_started {
                self.player.send(PlaybackCommand::PlayMuted(slide.clone()));
            }
            return;
        }
        self.awaiting_video_duration = false;
        self.video_started = false;
        self.countdown
            .start(Expiry::Advance, self.settings.image_duration, now);
        if self.paused {
            self.countdown.pause(now);
        }
    }

    fn enter_paused(&mut self, now: Instant) -> bool {
        if self.paused {
            return false;
        }
        self.paused = true;
        self.countdown.pause(now);
        let slide = self.current_slide().clone();
        if slide.is_video() {
            self.player.send(PlaybackCommand::Pause(slide));
        }
        info!(
            index = self.index,
            remaining = %humantime::format_duration(self.countdown.remaining(now)),
            "carousel paused"
        );
        true
    }

    fn leave_paused(&mut self, now: Instant) {
        self.paused = false;
        if self.countdown.is_paused() {
            self.countdown.resume(now);
        }
        let slide = self.current_slide().clone();
        if slide.is_video() {
            // A video shown while paused has not been started yet.
            let command = if self.video_started {
                PlaybackCommand::Resume(slide)
            } else {
                self.video_started = true;
                PlaybackCommand::PlayMuted(slide)
            };
            self.player.send(command);
        }
        info!(index = self.index, "carousel resumed");
    }
}

impl<S, P> CarouselController<S, P> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current_slide(&self) -> &Slide {
        &self.deck.as_slice()[self.index]
    }

    /// Length of the countdown currently (or most recently) armed.
    pub fn auto_advance_duration(&self) -> Duration {
        self.countdown.duration()
    }

    /// Time left on the auto-advance countdown.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.countdown.remaining(now)
    }

    pub fn countdown_running(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn player(&self) -> &P {
        &self.player
    }
}
