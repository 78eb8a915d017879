//! Unix socket accepting JSON control commands such as `{"command":"next"}`.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::CarouselInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum ControlCommand {
    Next,
    Previous,
    Press,
    Release,
}

impl From<ControlCommand> for CarouselInput {
    fn from(cmd: ControlCommand) -> Self {
        match cmd {
            ControlCommand::Next => CarouselInput::Next,
            ControlCommand::Previous => CarouselInput::Previous,
            ControlCommand::Press => CarouselInput::PressStart,
            ControlCommand::Release => CarouselInput::PressEnd,
        }
    }
}

/// Parse one connection's payload: zero or more JSON objects, optionally
/// separated by whitespace or newlines.
pub fn parse_commands(payload: &str) -> Result<Vec<ControlCommand>> {
    serde_json::Deserializer::from_str(payload)
        .into_iter::<ControlCommand>()
        .map(|cmd| cmd.context("invalid control command"))
        .collect()
}

pub async fn run(
    socket_path: PathBuf,
    to_carousel: Sender<CarouselInput>,
    cancel: CancellationToken,
) -> Result<()> {
    let listener = bind(&socket_path)?;
    info!(socket = %socket_path.display(), "control socket listening");

    loop {
        select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        let to_carousel = to_carousel.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, to_carousel).await {
                                warn!("control connection failed: {err:#}");
                            }
                        });
                    }
                    Err(err) => warn!("control socket accept failed: {err}"),
                }
            }
        }
    }

    if let Err(err) = std::fs::remove_file(&socket_path) {
        debug!(socket = %socket_path.display(), "failed to remove control socket: {err}");
    }
    Ok(())
}

fn bind(path: &Path) -> Result<UnixListener> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    match std::fs::remove_file(path) {
        Ok(()) => debug!(socket = %path.display(), "removed stale control socket"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to remove stale socket {}", path.display()));
        }
    }
    UnixListener::bind(path)
        .with_context(|| format!("failed to bind control socket at {}", path.display()))
}

async fn handle_connection(mut stream: UnixStream, to_carousel: Sender<CarouselInput>) -> Result<()> {
    let mut payload = String::new();
    stream
        .read_to_string(&mut payload)
        .await
        .context("failed to read control payload")?;
    for cmd in parse_commands(&payload)? {
        debug!(?cmd, "control command received");
        to_carousel
            .send(cmd.into())
            .await
            .context("carousel channel closed")?;
    }
    Ok(())
}
