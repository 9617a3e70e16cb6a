//! Slideshow controller: slide index, timing, pause and error state.
//!
//! All state lives on the render loop; time is injected as `Instant`
//! arguments so transitions are testable without sleeping, and the loader
//! is a trait seam so the machine is testable without a GPU.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::Error;
use crate::events::RemoteEvent;
use crate::slides::Slide;

/// Produces renderer-resident images for a slide. The viewer's GPU uploader
/// implements this; tests substitute an in-memory fake.
pub trait SlideLoader {
    type Image;

    /// Decode, correct, tile, and upload every photo of `slide`.
    ///
    /// # Errors
    /// Fails when any photo of the slide cannot be read or decoded; a
    /// partially loaded pair is never returned.
    fn load(&mut self, slide: &Slide) -> Result<Vec<Self::Image>, Error>;
}

/// Observable controller phase, derived from resident images, the paused
/// flag, and the retained error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Paused,
    Error,
}

/// The slideshow state machine. `I` is the renderer-resident image type;
/// dropping the resident vector releases the previous slide's resources
/// before the next slide loads, bounding peak decoded memory.
#[derive(Debug)]
pub struct Slideshow<I> {
    slides: Vec<Slide>,
    index: usize,
    resident: Vec<I>,
    paused: bool,
    last_error: Option<Error>,
    deadline: Instant,
    interval: Duration,
}

impl<I> Slideshow<I> {
    /// # Errors
    /// `Error::EmptyCatalog` when there are no slides to show.
    pub fn new(slides: Vec<Slide>, interval: Duration, now: Instant) -> Result<Self, Error> {
        if slides.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        Ok(Self {
            slides,
            index: 0,
            resident: Vec::new(),
            paused: false,
            last_error: None,
            deadline: now + interval,
            interval,
        })
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.last_error.is_some() {
            Phase::Error
        } else if self.resident.is_empty() {
            Phase::Loading
        } else if self.paused {
            Phase::Paused
        } else {
            Phase::Ready
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    #[must_use]
    pub fn current_slide(&self) -> &Slide {
        &self.slides[self.index]
    }

    /// Images resident for the current slide; empty while loading or after
    /// a failure.
    #[must_use]
    pub fn resident(&self) -> &[I] {
        &self.resident
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Load the current slide, releasing the previous slide's images first
    /// so a failure shows the error message, never stale pixels.
    pub fn load_current<L: SlideLoader<Image = I>>(&mut self, loader: &mut L) {
        let was_failed = self.last_error.is_some();
        // Release before load: at most one slide resident at a time.
        self.resident.clear();

        if self.index >= self.slides.len() {
            // Unreachable while the wraparound arithmetic holds.
            self.last_error = Some(Error::InvalidIndex {
                index: self.index,
                len: self.slides.len(),
            });
            self.paused = false;
            return;
        }

        match loader.load(&self.slides[self.index]) {
            Ok(images) => {
                self.resident = images;
                self.last_error = None;
                if was_failed {
                    info!(slide = self.index, "slide loaded; leaving error state");
                } else {
                    info!(slide = self.index, "slide loaded");
                }
            }
            Err(err) => {
                warn!(slide = self.index, error = %err, "slide failed to load; entering error state");
                self.last_error = Some(err);
                // An error display supersedes a pause; recovery always
                // lands in READY.
                self.paused = false;
            }
        }
    }

    /// Advance one slide with wraparound and reload; resets the deadline.
    pub fn advance<L: SlideLoader<Image = I>>(&mut self, loader: &mut L, now: Instant) {
        self.index = (self.index + 1) % self.slides.len();
        self.load_current(loader);
        self.deadline = now + self.interval;
    }

    /// Retreat one slide, wrapping to the last slide before index 0.
    pub fn retreat<L: SlideLoader<Image = I>>(&mut self, loader: &mut L, now: Instant) {
        self.index = (self.index + self.slides.len() - 1) % self.slides.len();
        self.load_current(loader);
        self.deadline = now + self.interval;
    }

    /// Apply one remote event. Left/Right navigate from any phase; Select
    /// toggles pause and is ignored while an error is displayed.
    pub fn handle_event<L: SlideLoader<Image = I>>(
        &mut self,
        event: RemoteEvent,
        loader: &mut L,
        now: Instant,
    ) {
        match event {
            RemoteEvent::Right => self.advance(loader, now),
            RemoteEvent::Left => self.retreat(loader, now),
            RemoteEvent::Select => {
                if self.last_error.is_some() {
                    return;
                }
                self.paused = !self.paused;
                if self.paused {
                    info!(slide = self.index, "slideshow paused");
                } else {
                    // Resuming grants the slide a full interval again.
                    self.deadline = now + self.interval;
                    info!(slide = self.index, "slideshow resumed");
                }
            }
        }
    }

    /// Timer check for one render tick: auto-advance when the deadline has
    /// elapsed and the show is not paused. In the error phase the timer
    /// still fires — the next navigation is the retry mechanism.
    /// Returns whether an advance happened.
    pub fn poll_deadline<L: SlideLoader<Image = I>>(&mut self, loader: &mut L, now: Instant) -> bool {
        if self.paused || now < self.deadline {
            return false;
        }
        self.advance(loader, now);
        true
    }
}
