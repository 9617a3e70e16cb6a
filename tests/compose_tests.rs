//! Slide composition properties: every photo exactly once, order preserved,
//! only portrait pairs, deterministic output.

use std::path::PathBuf;

use frameshow::meta::{Orientation, Photo};
use frameshow::slides::compose;

fn photo(name: &str, w: u32, h: u32) -> Photo {
    photo_oriented(name, w, h, Orientation::Normal)
}

fn photo_oriented(name: &str, w: u32, h: u32, orientation: Orientation) -> Photo {
    Photo {
        path: PathBuf::from(name),
        taken_at: "2021-06-01T12:00:00Z".parse().unwrap(),
        width: w,
        height: h,
        orientation,
        coordinates: None,
    }
}

fn flatten(slides: &[frameshow::slides::Slide]) -> Vec<PathBuf> {
    slides
        .iter()
        .flat_map(|s| s.photos().iter().map(|p| p.path.clone()))
        .collect()
}

#[test]
fn pairs_adjacent_portraits_before_a_landscape() {
    let photos = vec![
        photo("a.jpg", 1000, 1500),
        photo("b.jpg", 1200, 1600),
        photo("c.jpg", 1920, 1080),
    ];
    let slides = compose(&photos, true);
    assert_eq!(slides.len(), 2);
    assert!(slides[0].is_pair());
    assert_eq!(slides[0].photos()[0].path, PathBuf::from("a.jpg"));
    assert_eq!(slides[0].photos()[1].path, PathBuf::from("b.jpg"));
    assert!(!slides[1].is_pair());
    assert_eq!(slides[1].photos()[0].path, PathBuf::from("c.jpg"));
}

#[test]
fn covers_every_photo_exactly_once_in_order() {
    let photos = vec![
        photo("0.jpg", 900, 1600),
        photo("1.jpg", 1600, 900),
        photo("2.jpg", 900, 1600),
        photo("3.jpg", 900, 1600),
        photo("4.jpg", 900, 1600),
        photo("5.jpg", 1600, 900),
    ];
    let slides = compose(&photos, true);
    let expected: Vec<PathBuf> = photos.iter().map(|p| p.path.clone()).collect();
    assert_eq!(flatten(&slides), expected);
}

#[test]
fn portrait_after_landscape_is_not_repaired() {
    // 1 is portrait but follows a landscape; 2+3 pair up, leaving 1 single.
    let photos = vec![
        photo("0.jpg", 1600, 900),
        photo("1.jpg", 900, 1600),
        photo("2.jpg", 900, 1600),
        photo("3.jpg", 900, 1600),
    ];
    let slides = compose(&photos, true);
    let kinds: Vec<bool> = slides.iter().map(frameshow::slides::Slide::is_pair).collect();
    assert_eq!(kinds, vec![false, true, false]);
}

#[test]
fn odd_portrait_run_leaves_a_trailing_single() {
    let photos = vec![
        photo("0.jpg", 900, 1600),
        photo("1.jpg", 900, 1600),
        photo("2.jpg", 900, 1600),
    ];
    let slides = compose(&photos, true);
    assert_eq!(slides.len(), 2);
    assert!(slides[0].is_pair());
    assert!(!slides[1].is_pair());
}

#[test]
fn pairing_disabled_yields_only_singles() {
    let photos = vec![photo("0.jpg", 900, 1600), photo("1.jpg", 900, 1600)];
    let slides = compose(&photos, false);
    assert_eq!(slides.len(), 2);
    assert!(slides.iter().all(|s| !s.is_pair()));
}

#[test]
fn portraitness_is_judged_on_oriented_dimensions() {
    // Raw landscape buffers that display as portraits after rotation.
    let photos = vec![
        photo_oriented("0.jpg", 1600, 900, Orientation::Rotate90),
        photo_oriented("1.jpg", 1600, 900, Orientation::Rotate270),
    ];
    let slides = compose(&photos, true);
    assert_eq!(slides.len(), 1);
    assert!(slides[0].is_pair());
}

#[test]
fn composition_is_deterministic() {
    let photos: Vec<Photo> = (0..12)
        .map(|i| {
            if i % 3 == 0 {
                photo(&format!("{i}.jpg"), 1600, 900)
            } else {
                photo(&format!("{i}.jpg"), 900, 1600)
            }
        })
        .collect();
    let one = flatten(&compose(&photos, true));
    let two = flatten(&compose(&photos, true));
    assert_eq!(one, two);
}

#[test]
fn empty_catalog_composes_to_no_slides() {
    assert!(compose(&[], true).is_empty());
}
