use std::future;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::controller::CarouselController;
use crate::events::{CarouselInput, CarouselView};
use crate::playback::MediaPlayer;
use crate::store::IndexStore;

/// Owns the controller and feeds it inputs and deadlines one at a time.
///
/// Rules:
/// - The controller is initialized from the persisted index before anything else.
/// - Between events the task sleeps until the controller's nearest deadline.
/// - A fresh [`CarouselView`] is published after every input or expiry.
/// - When the input side closes the loop keeps running until no deadline is left.
pub async fn run<S, P>(
    mut controller: CarouselController<S, P>,
    mut inputs: Receiver<CarouselInput>,
    views: watch::Sender<CarouselView>,
    cancel: CancellationToken,
) -> Result<()>
where
    S: IndexStore,
    P: MediaPlayer,
{
    controller.initialize(now());
    views.send_replace(controller.view(now()));

    let mut inputs_open = true;
    loop {
        let wait = controller.time_until_deadline(now());
        if !inputs_open && wait.is_none() {
            debug!("no inputs and nothing scheduled; carousel task done");
            break;
        }
        select! {
            _ = cancel.cancelled() => break,

            maybe_input = inputs.recv(), if inputs_open => {
                match maybe_input {
                    Some(input) => {
                        debug!(?input, "carousel input");
                        controller.handle_input(input, now());
                    }
                    None => {
                        debug!("carousel input channel closed");
                        inputs_open = false;
                        continue;
                    }
                }
            }

            _ = sleep_or_forever(wait) => {
                controller.handle_timeout(now());
            }
        }
        views.send_replace(controller.view(now()));
    }

    Ok(())
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

async fn sleep_or_forever(wait: Option<Duration>) {
    match wait {
        Some(wait) => sleep(wait).await,
        None => future::pending().await,
    }
}
