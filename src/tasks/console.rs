use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::CarouselInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Input(ConsoleInput),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleInput {
    Next,
    Previous,
    Hold,
    Release,
}

impl From<ConsoleInput> for CarouselInput {
    fn from(input: ConsoleInput) -> Self {
        match input {
            ConsoleInput::Next => CarouselInput::Next,
            ConsoleInput::Previous => CarouselInput::Previous,
            ConsoleInput::Hold => CarouselInput::PressStart,
            ConsoleInput::Release => CarouselInput::PressEnd,
        }
    }
}

pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let cmd = match line.trim().to_ascii_lowercase().as_str() {
        "n" | "next" => ConsoleCommand::Input(ConsoleInput::Next),
        "p" | "prev" | "previous" => ConsoleCommand::Input(ConsoleInput::Previous),
        "h" | "hold" | "press" => ConsoleCommand::Input(ConsoleInput::Hold),
        "r" | "release" => ConsoleCommand::Input(ConsoleInput::Release),
        "q" | "quit" | "exit" => ConsoleCommand::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// Read line commands from stdin until EOF, `quit`, or cancellation.
pub async fn run(to_carousel: Sender<CarouselInput>, cancel: CancellationToken) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    debug!("stdin closed; console input stopped");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Some(ConsoleCommand::Quit) => {
                        info!("quit requested; initiating shutdown");
                        cancel.cancel();
                        break;
                    }
                    Some(ConsoleCommand::Input(input)) => {
                        if to_carousel.send(input.into()).await.is_err() {
                            warn!("carousel channel closed");
                            break;
                        }
                    }
                    None => warn!(%line, "unknown command (next, prev, hold, release, quit)"),
                }
            }
        }
    }
    Ok(())
}
