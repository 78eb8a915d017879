//! Binary entrypoint for the media carousel.
//!
//! Hosts the controller on a tokio runtime; all carousel logic lives in the
//! library crate.

use std::collections::HashMap;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

use media_carousel::config::Configuration;
use media_carousel::events::{CarouselInput, CarouselView, PlaybackCommand};
use media_carousel::playback::{ChannelPlayer, MAX_COMMANDS_PER_EVENT};
use media_carousel::store::{IndexStore, JsonFileStore, MemoryStore};
use media_carousel::tasks;
use media_carousel::{CarouselController, SlideId};

#[derive(Debug, Parser)]
#[command(
    name = "media-carousel",
    version,
    about = "Auto-advancing image/video carousel"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Override per-image duration (ms)
    #[arg(long, value_name = "MILLIS")]
    image_duration_ms: Option<u64>,

    /// Do not listen on the control socket
    #[arg(long)]
    no_control_socket: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        n => {
            let level = if n == 1 { Level::DEBUG } else { Level::TRACE };
            EnvFilter::new(format!("media_carousel={level}"))
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        image_duration_ms,
        no_control_socket,
        verbose,
    } = Args::parse();
    init_tracing(verbose)?;

    let mut cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?;
    if let Some(ms) = image_duration_ms {
        cfg.image_duration = Duration::from_millis(ms);
    }
    let cfg = cfg.validated().context("invalid configuration values")?;
    info!(
        slides = cfg.slides.len(),
        image_duration = %humantime::format_duration(cfg.image_duration),
        "loaded configuration from {}",
        config.display()
    );

    let store: Box<dyn IndexStore + Send> = match &cfg.state_path {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => {
            debug!("no state-path configured; last index is kept in memory");
            Box::new(MemoryStore::new())
        }
    };

    // Channels (small/bounded)
    let (input_tx, input_rx) = mpsc::channel::<CarouselInput>(32); // Console/Control/Player -> Carousel
    // Carousel -> Player; room for several events' worth of commands before any drop.
    let (playback_tx, playback_rx) =
        mpsc::channel::<PlaybackCommand>(8 * MAX_COMMANDS_PER_EVENT);
    let (view_tx, view_rx) = watch::channel(CarouselView::default()); // Carousel -> surface

    let controller = CarouselController::new(
        cfg.deck()?,
        cfg.controller_settings(),
        store,
        ChannelPlayer::new(playback_tx),
    );

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            tasks::carousel::run(controller, input_rx, view_tx, cancel)
                .await
                .context("carousel task failed")
        }
    });

    tasks.spawn({
        let to_carousel = input_tx.clone();
        let cancel = cancel.clone();
        let durations: HashMap<SlideId, Duration> = cfg
            .slides
            .iter()
            .filter_map(|s| s.natural_duration.map(|d| (s.id.clone(), d)))
            .collect();
        let startup_delay = cfg.player_startup_delay;
        async move {
            tasks::player::run(playback_rx, to_carousel, durations, startup_delay, cancel)
                .await
                .context("player task failed")
        }
    });

    if io::stdin().is_terminal() {
        tasks.spawn({
            let to_carousel = input_tx.clone();
            let cancel = cancel.clone();
            async move {
                tasks::console::run(to_carousel, cancel)
                    .await
                    .context("console task failed")
            }
        });
    } else {
        debug!("stdin is not a terminal; console commands disabled");
    }

    #[cfg(unix)]
    {
        if !no_control_socket {
            let to_carousel = input_tx.clone();
            let cancel = cancel.clone();
            let socket = cfg.control_socket_path.clone();
            tasks.spawn(async move {
                tasks::control::run(socket, to_carousel, cancel)
                    .await
                    .context("control socket task failed")
            });
        }
    }
    #[cfg(not(unix))]
    let _ = no_control_socket;

    drop(input_tx);

    tasks.spawn(log_views(view_rx, cancel.clone()));

    // Wait for the first task to finish, then ask the rest to stop.
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
        if !cancel.is_cancelled() {
            debug!("a task finished; initiating shutdown");
        }
        cancel.cancel();
    }

    Ok(())
}

/// Headless surface: logs the carousel whenever it moves or pauses.
async fn log_views(mut views: watch::Receiver<CarouselView>, cancel: CancellationToken) -> Result<()> {
    let mut last: Option<(usize, bool)> = None;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                let key = (view.index, view.paused);
                if last != Some(key) {
                    info!(
                        slide = view.index + 1,
                        of = view.slide_count,
                        paused = view.paused,
                        "carousel"
                    );
                    last = Some(key);
                }
            }
        }
    }
    Ok(())
}
