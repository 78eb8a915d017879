use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

use crate::controller::{ControllerSettings, DEFAULT_IMAGE_DURATION};
use crate::deck::{MediaKind, Slide, SlideDeck, SlideId};
use crate::press::DEFAULT_HOLD_DELAY;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SlideConfig {
    pub id: SlideId,
    pub source: String,
    pub kind: MediaKind,
    /// Length the simulated player reports for a video.
    #[serde(default, with = "humantime_serde")]
    pub natural_duration: Option<Duration>,
}

impl SlideConfig {
    pub fn to_slide(&self) -> Slide {
        Slide {
            id: self.id.clone(),
            source: self.source.clone(),
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Slides in navigation order.
    pub slides: Vec<SlideConfig>,
    /// How long each image is shown before advancing.
    #[serde(with = "humantime_serde")]
    pub image_duration: Duration,
    /// How long a press must be held before the carousel pauses.
    #[serde(with = "humantime_serde")]
    pub hold_delay: Duration,
    /// JSON file remembering the last shown slide. `None` keeps it in memory.
    pub state_path: Option<PathBuf>,
    /// Unix domain socket accepting runtime control commands.
    pub control_socket_path: PathBuf,
    /// Startup latency of the simulated video player.
    #[serde(with = "humantime_serde")]
    pub player_startup_delay: Duration,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            slides: Vec::new(),
            image_duration: DEFAULT_IMAGE_DURATION,
            hold_delay: DEFAULT_HOLD_DELAY,
            state_path: None,
            control_socket_path: Self::default_control_socket_path(),
            player_startup_delay: Duration::from_millis(50),
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    fn default_control_socket_path() -> PathBuf {
        PathBuf::from("/run/media-carousel/control.sock")
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(!self.slides.is_empty(), "slides must not be empty");
        ensure!(
            !self.image_duration.is_zero(),
            "image-duration must be greater than zero"
        );
        ensure!(
            !self.hold_delay.is_zero(),
            "hold-delay must be greater than zero"
        );
        let mut seen = HashSet::new();
        for slide in &self.slides {
            ensure!(
                !slide.id.as_str().is_empty(),
                "slide ids must not be empty"
            );
            ensure!(seen.insert(&slide.id), "duplicate slide id: {}", slide.id);
            ensure!(
                !slide.source.trim().is_empty(),
                "slide {} has an empty source",
                slide.id
            );
            match (slide.kind, slide.natural_duration) {
                (MediaKind::Image, Some(_)) => {
                    bail!("slide {}: natural-duration only applies to videos", slide.id)
                }
                (MediaKind::Video, Some(d)) => ensure!(
                    !d.is_zero(),
                    "slide {}: natural-duration must be greater than zero",
                    slide.id
                ),
                _ => {}
            }
        }
        ensure!(
            self.control_socket_path.file_name().is_some(),
            "control-socket-path must include a socket file name"
        );
        Ok(self)
    }

    pub fn deck(&self) -> Result<SlideDeck> {
        SlideDeck::from_vec(self.slides.iter().map(SlideConfig::to_slide).collect())
            .context("invalid slide list")
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            image_duration: self.image_duration,
            hold_delay: self.hold_delay,
        }
    }
}
