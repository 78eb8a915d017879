use std::time::Duration;

use crate::deck::{Slide, SlideId};

/// Everything that can happen to a running carousel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarouselInput {
    Next,
    Previous,
    PressStart,
    PressEnd,
    /// The host player reports that a video started playing.
    VideoPlaying {
        id: SlideId,
        natural_duration: Option<Duration>,
    },
}

/// Emitted by the controller for the host's media player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// Seek to the start and stay paused.
    Reset(Slide),
    PlayMuted(Slide),
    Pause(Slide),
    Resume(Slide),
}

impl PlaybackCommand {
    pub fn slide(&self) -> &Slide {
        match self {
            Self::Reset(slide) | Self::PlayMuted(slide) | Self::Pause(slide) | Self::Resume(slide) => {
                slide
            }
        }
    }
}

/// Read-only snapshot handed to whatever renders the carousel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarouselView {
    pub index: usize,
    pub slide_count: usize,
    pub paused: bool,
    /// One fill fraction per slide, in `[0, 1]`.
    pub progress: Vec<f32>,
}
