use thiserror::Error;

/// Library error type for building a slide deck.
#[derive(Debug, Error)]
pub enum Error {
    /// The carousel was given no slides.
    #[error("a carousel needs at least one slide")]
    EmptyDeck,

    /// Two slides share the same identifier.
    #[error("duplicate slide id: {0}")]
    DuplicateSlide(String),
}
