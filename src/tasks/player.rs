//! Stand-in for a host video element.
//!
//! Videos report "playing" a short while after they are first started,
//! along with the natural duration configured for the slide.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::deck::SlideId;
use crate::events::{CarouselInput, PlaybackCommand};

pub async fn run(
    mut commands: Receiver<PlaybackCommand>,
    to_carousel: Sender<CarouselInput>,
    natural_durations: HashMap<SlideId, Duration>,
    startup_delay: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    // Slides whose first "playing" event was already delivered since their last reset.
    let mut reported: HashSet<SlideId> = HashSet::new();
    let mut pending: Option<(SlideId, Instant)> = None;

    loop {
        let deadline = pending
            .as_ref()
            .map(|(_, at)| *at)
            .unwrap_or_else(Instant::now);
        select! {
            _ = cancel.cancelled() => break,

            maybe_cmd = commands.recv() => {
                let Some(cmd) = maybe_cmd else {
                    debug!("playback channel closed");
                    break;
                };
                match cmd {
                    PlaybackCommand::Reset(slide) => {
                        debug!(slide = %slide.id, "video rewound");
                        reported.remove(&slide.id);
                        if pending.as_ref().is_some_and(|(id, _)| *id == slide.id) {
                            pending = None;
                        }
                    }
                    PlaybackCommand::PlayMuted(slide) | PlaybackCommand::Resume(slide) => {
                        info!(slide = %slide.id, source = %slide.source, "video playing (muted)");
                        if !reported.contains(&slide.id) {
                            pending = Some((slide.id, Instant::now() + startup_delay));
                        }
                    }
                    PlaybackCommand::Pause(slide) => {
                        info!(slide = %slide.id, "video paused");
                        if pending.as_ref().is_some_and(|(id, _)| *id == slide.id) {
                            pending = None;
                        }
                    }
                }
            }

            _ = sleep_until(deadline), if pending.is_some() => {
                if let Some((id, _)) = pending.take() {
                    let natural_duration = natural_durations.get(&id).copied();
                    reported.insert(id.clone());
                    if to_carousel
                        .send(CarouselInput::VideoPlaying { id, natural_duration })
                        .await
                        .is_err()
                    {
                        warn!("carousel channel closed");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
