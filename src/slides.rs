//! Slide composition: group the ordered catalog into display units.

use crate::meta::Photo;

/// A display unit holding one photo, or two portraits shown side by side.
#[derive(Debug, Clone)]
pub struct Slide {
    photos: Vec<Photo>,
}

impl Slide {
    fn single(photo: Photo) -> Self {
        Self {
            photos: vec![photo],
        }
    }

    fn pair(left: Photo, right: Photo) -> Self {
        Self {
            photos: vec![left, right],
        }
    }

    #[must_use]
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    #[must_use]
    pub fn is_pair(&self) -> bool {
        self.photos.len() == 2
    }
}

/// Compose slides with one greedy left-to-right pass: two consecutive
/// portraits become a side-by-side pair when `pair_portraits` is enabled,
/// everything else is a single. No backtracking — a portrait consumed as
/// the second half of a pair is never reconsidered.
#[must_use]
pub fn compose(photos: &[Photo], pair_portraits: bool) -> Vec<Slide> {
    let mut slides = Vec::with_capacity(photos.len());
    let mut i = 0;
    while i < photos.len() {
        let current = &photos[i];
        if pair_portraits
            && current.is_portrait()
            && let Some(next) = photos.get(i + 1)
            && next.is_portrait()
        {
            slides.push(Slide::pair(current.clone(), next.clone()));
            i += 2;
            continue;
        }
        slides.push(Slide::single(current.clone()));
        i += 1;
    }
    slides
}
