pub mod config;
pub mod controller;
pub mod deck;
pub mod error;
pub mod events;
pub mod playback;
pub mod press;
pub mod store;
pub mod timer;
pub mod tasks {
    pub mod carousel;
    pub mod console;
    #[cfg(unix)]
    pub mod control;
    pub mod player;
}

pub use controller::{CarouselController, ControllerSettings};
pub use deck::{MediaKind, Slide, SlideDeck, SlideId};
pub use timer::PausableTimer;
