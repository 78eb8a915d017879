use std::collections::HashMap;
use std::time::{Duration, Instant};

use media_carousel::events::{CarouselInput, CarouselView, PlaybackCommand};
use media_carousel::playback::ChannelPlayer;
use media_carousel::store::{IndexStore, LAST_INDEX_KEY, MemoryStore};
use media_carousel::tasks::{carousel, player};
use media_carousel::{CarouselController, ControllerSettings, Slide, SlideDeck, SlideId};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

async fn wait_for_view(
    views: &mut watch::Receiver<CarouselView>,
    within: Duration,
    pred: impl FnMut(&CarouselView) -> bool,
) -> CarouselView {
    tokio::time::timeout(within, views.wait_for(pred))
        .await
        .expect("timeout waiting for carousel view")
        .expect("carousel view channel closed")
        .clone()
}

fn settings(image_ms: u64, hold_ms: u64) -> ControllerSettings {
    ControllerSettings {
        image_duration: Duration::from_millis(image_ms),
        hold_delay: Duration::from_millis(hold_ms),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn images_auto_advance_and_stop_at_the_end() {
    let deck = SlideDeck::from_vec(vec![
        Slide::image("a", "/a.jpg"),
        Slide::image("b", "/b.jpg"),
        Slide::image("c", "/c.jpg"),
    ])
    .unwrap();
    let (playback_tx, _playback_rx) = mpsc::channel::<PlaybackCommand>(8);
    let (_input_tx, input_rx) = mpsc::channel::<CarouselInput>(8);
    let (view_tx, mut view_rx) = watch::channel(CarouselView::default());
    let cancel = CancellationToken::new();

    let controller = CarouselController::new(
        deck,
        settings(100, 300),
        MemoryStore::new(),
        ChannelPlayer::new(playback_tx),
    );
    let start = Instant::now();
    let handle = tokio::spawn(carousel::run(controller, input_rx, view_tx, cancel.clone()));

    let view = wait_for_view(&mut view_rx, Duration::from_secs(2), |v| v.index == 2).await;
    assert!(
        start.elapsed() >= Duration::from_millis(200),
        "advanced too early: {:?}",
        start.elapsed()
    );
    assert_eq!(view.slide_count, 3);
    assert_eq!(view.progress[0], 1.0);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(view_rx.borrow().index, 2, "last slide must not wrap around");

    cancel.cancel();
    let _ = handle.await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn video_advances_after_its_natural_duration() {
    let deck = SlideDeck::from_vec(vec![
        Slide::video("clip", "/clip.mp4"),
        Slide::image("after", "/after.jpg"),
    ])
    .unwrap();
    let (playback_tx, playback_rx) = mpsc::channel::<PlaybackCommand>(8);
    let (input_tx, input_rx) = mpsc::channel::<CarouselInput>(8);
    let (view_tx, mut view_rx) = watch::channel(CarouselView::default());
    let cancel = CancellationToken::new();

    let mut durations = HashMap::new();
    durations.insert(SlideId::new("clip"), Duration::from_millis(150));
    let player_handle = tokio::spawn(player::run(
        playback_rx,
        input_tx,
        durations,
        Duration::from_millis(10),
        cancel.clone(),
    ));

    let controller = CarouselController::new(
        deck,
        // Image duration far longer than the clip: advancing early means the
        // natural duration was ignored.
        settings(10_000, 300),
        MemoryStore::new(),
        ChannelPlayer::new(playback_tx),
    );
    let start = Instant::now();
    let handle = tokio::spawn(carousel::run(controller, input_rx, view_tx, cancel.clone()));

    wait_for_view(&mut view_rx, Duration::from_secs(2), |v| v.index == 1).await;
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_millis(150),
        "advanced before the clip finished: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_secs(2),
        "fell back to the image duration: {elapsed:?}"
    );

    cancel.cancel();
    let _ = handle.await;
    let _ = player_handle.await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn press_and_hold_pauses_until_release() {
    let deck = SlideDeck::from_vec(vec![
        Slide::image("a", "/a.jpg"),
        Slide::image("b", "/b.jpg"),
    ])
    .unwrap();
    let (playback_tx, _playback_rx) = mpsc::channel::<PlaybackCommand>(8);
    let (input_tx, input_rx) = mpsc::channel::<CarouselInput>(8);
    let (view_tx, mut view_rx) = watch::channel(CarouselView::default());
    let cancel = CancellationToken::new();

    let controller = CarouselController::new(
        deck,
        settings(300, 50),
        MemoryStore::new(),
        ChannelPlayer::new(playback_tx),
    );
    let handle = tokio::spawn(carousel::run(controller, input_rx, view_tx, cancel.clone()));

    input_tx.send(CarouselInput::PressStart).await.unwrap();
    wait_for_view(&mut view_rx, Duration::from_secs(1), |v| v.paused).await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    {
        let view = view_rx.borrow();
        assert_eq!(view.index, 0, "paused carousel must not advance");
        assert!(view.paused);
    }

    input_tx.send(CarouselInput::PressEnd).await.unwrap();
    let view = wait_for_view(&mut view_rx, Duration::from_secs(2), |v| v.index == 1).await;
    assert!(!view.paused);

    cancel.cancel();
    let _ = handle.await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resumes_at_persisted_index_and_navigates_back() {
    let deck = SlideDeck::from_vec(vec![
        Slide::image("a", "/a.jpg"),
        Slide::image("b", "/b.jpg"),
        Slide::image("c", "/c.jpg"),
    ])
    .unwrap();
    let (playback_tx, _playback_rx) = mpsc::channel::<PlaybackCommand>(8);
    let (input_tx, input_rx) = mpsc::channel::<CarouselInput>(8);
    let (view_tx, mut view_rx) = watch::channel(CarouselView::default());
    let cancel = CancellationToken::new();

    let controller = CarouselController::new(
        deck,
        settings(10_000, 300),
        MemoryStore::with_entry(LAST_INDEX_KEY, "1"),
        ChannelPlayer::new(playback_tx),
    );
    let handle = tokio::spawn(carousel::run(controller, input_rx, view_tx, cancel.clone()));

    wait_for_view(&mut view_rx, Duration::from_secs(1), |v| v.index == 1 && v.slide_count == 3)
        .await;
    input_tx.send(CarouselInput::Previous).await.unwrap();
    input_tx.send(CarouselInput::Previous).await.unwrap();
    wait_for_view(&mut view_rx, Duration::from_secs(1), |v| v.index == 0).await;

    input_tx.send(CarouselInput::Previous).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(view_rx.borrow().index, 0, "previous at the first slide is a no-op");

    cancel.cancel();
    let _ = handle.await;
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn control_socket_forwards_commands() {
    use media_carousel::tasks::control;
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixStream;

    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("control.sock");
    let (input_tx, mut input_rx) = mpsc::channel::<CarouselInput>(8);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(control::run(socket.clone(), input_tx, cancel.clone()));

    let mut stream = None;
    for _ in 0..50 {
        match UnixStream::connect(&socket).await {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    let mut stream = stream.expect("control socket never came up");
    stream
        .write_all(br#"{"command":"next"}{"command":"press"}"#)
        .await
        .unwrap();
    stream.shutdown().await.unwrap();
    drop(stream);

    let first = tokio::time::timeout(Duration::from_secs(1), input_rx.recv())
        .await
        .expect("timeout waiting for control input")
        .expect("input channel closed");
    assert_eq!(first, CarouselInput::Next);
    let second = tokio::time::timeout(Duration::from_secs(1), input_rx.recv())
        .await
        .expect("timeout waiting for control input")
        .expect("input channel closed");
    assert_eq!(second, CarouselInput::PressStart);

    cancel.cancel();
    let _ = handle.await;
    assert!(!socket.exists(), "socket file removed on shutdown");
}

#[test]
fn memory_store_is_usable_through_a_box() {
    let mut store: Box<dyn IndexStore + Send> = Box::new(MemoryStore::new());
    store.save(LAST_INDEX_KEY, "4").unwrap();
    assert_eq!(store.load(LAST_INDEX_KEY).unwrap().as_deref(), Some("4"));
}
