use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use crate::events::PlaybackCommand;

/// Host-side media player driven by the controller.
pub trait MediaPlayer {
    fn send(&mut self, command: PlaybackCommand);
}

/// Player for hosts that only show images.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlayer;

impl MediaPlayer for NullPlayer {
    fn send(&mut self, _command: PlaybackCommand) {}
}

/// Most commands a single controller event can emit: `Pause` for the video
/// being left, then `Reset` and `PlayMuted` for the new one.
pub const MAX_COMMANDS_PER_EVENT: usize = 3;

/// Forwards commands to an async player task.
///
/// Sends never block the controller. Size the channel with headroom over
/// [`MAX_COMMANDS_PER_EVENT`]; a full queue drops the command with a warning.
#[derive(Debug, Clone)]
pub struct ChannelPlayer {
    tx: mpsc::Sender<PlaybackCommand>,
}

impl ChannelPlayer {
    pub fn new(tx: mpsc::Sender<PlaybackCommand>) -> Self {
        Self { tx }
    }
}

impl MediaPlayer for ChannelPlayer {
    fn send(&mut self, command: PlaybackCommand) {
        match self.tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(cmd)) => {
                warn!(slide = %cmd.slide().id, "player queue full; dropping {cmd:?}");
            }
            Err(TrySendError::Closed(cmd)) => {
                warn!(slide = %cmd.slide().id, "player channel closed; dropping {cmd:?}");
            }
        }
    }
}
