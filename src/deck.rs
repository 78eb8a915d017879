//! Ordered, immutable list of slides the carousel navigates through.

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct SlideId(String);

impl SlideId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub id: SlideId,
    /// Opaque locator resolved by the host.
    pub source: String,
    pub kind: MediaKind,
}

impl Slide {
    pub fn image(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: SlideId::new(id),
            source: source.into(),
            kind: MediaKind::Image,
        }
    }

    pub fn video(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: SlideId::new(id),
            source: source.into(),
            kind: MediaKind::Video,
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Non-empty slide sequence with unique ids. Order is navigation order.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    slides: Vec<Slide>,
}

impl SlideDeck {
    /// Construct a deck from a list of slides.
    ///
    /// # Errors
    /// Returns [`Error::EmptyDeck`] if `slides` is empty and
    /// [`Error::DuplicateSlide`] if two slides share an id.
    pub fn from_vec(slides: Vec<Slide>) -> Result<Self, Error> {
        if slides.is_empty() {
            return Err(Error::EmptyDeck);
        }
        let mut seen = HashSet::with_capacity(slides.len());
        for slide in &slides {
            if !seen.insert(&slide.id) {
                return Err(Error::DuplicateSlide(slide.id.to_string()));
            }
        }
        Ok(Self { slides })
    }

    /// Number of slides; always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.slides.len() - 1
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    #[must_use]
    pub fn position(&self, id: &SlideId) -> Option<usize> {
        self.slides.iter().position(|slide| &slide.id == id)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Slide] {
        &self.slides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_deck() {
        assert!(matches!(SlideDeck::from_vec(Vec::new()), Err(Error::EmptyDeck)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = SlideDeck::from_vec(vec![Slide::image("a", "/a.jpg"), Slide::video("a", "/a.mp4")])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateSlide(ref id) if id == "a"));
    }

    #[test]
    fn lookup_by_index_and_id() {
        let deck = SlideDeck::from_vec(vec![
            Slide::image("a", "/a.jpg"),
            Slide::video("b", "/b.mp4"),
        ])
        .unwrap();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.last_index(), 1);
        assert!(deck.get(1).unwrap().is_video());
        assert!(deck.get(2).is_none());
        assert_eq!(deck.position(&SlideId::new("b")), Some(1));
        assert_eq!(deck.position(&SlideId::new("zz")), None);
    }
}
