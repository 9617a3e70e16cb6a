//! Tiling and orientation properties: reassembly is pixel-exact, grids are
//! row-major, and every orientation transform is undone by its inverse.

use std::path::PathBuf;

use image::{Rgba, RgbaImage};

use frameshow::meta::{Orientation, Photo};
use frameshow::tiles::{apply_orientation, load_tiled, reassemble, slice_into_tiles};

/// An asymmetric gradient so any flipped/rotated/shifted pixel is detected.
fn test_image(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([x as u8, y as u8, (x * 7 + y * 13) as u8, 255])
    })
}

fn photo_at(path: PathBuf, w: u32, h: u32, orientation: Orientation) -> Photo {
    Photo {
        path,
        taken_at: "2021-06-01T12:00:00Z".parse().unwrap(),
        width: w,
        height: h,
        orientation,
        coordinates: None,
    }
}

#[test]
fn small_image_is_a_single_tile() {
    let img = test_image(30, 20);
    let grid = slice_into_tiles(&img, 32);
    assert_eq!((grid.cols, grid.rows), (1, 1));
    assert_eq!(grid.tiles.len(), 1);
    assert_eq!(grid.tiles[0].width, 30);
    assert_eq!(grid.tiles[0].height, 20);
    assert_eq!(reassemble(&grid), img);
}

#[test]
fn oversized_image_splits_with_remainders() {
    // 70x50 with 32px tiles: 3 columns (32, 32, 6) x 2 rows (32, 18).
    let img = test_image(70, 50);
    let grid = slice_into_tiles(&img, 32);
    assert_eq!((grid.cols, grid.rows), (3, 2));
    assert_eq!(grid.tiles.len(), 6);
    assert_eq!(grid.tiles[2].width, 6);
    assert_eq!(grid.tiles[5].height, 18);
    assert_eq!(reassemble(&grid), img);
}

#[test]
fn exact_multiple_has_no_remainder_tiles() {
    let img = test_image(64, 32);
    let grid = slice_into_tiles(&img, 32);
    assert_eq!((grid.cols, grid.rows), (2, 1));
    assert!(grid.tiles.iter().all(|t| t.width == 32 && t.height == 32));
    assert_eq!(reassemble(&grid), img);
}

#[test]
fn tiles_are_row_major() {
    let grid = slice_into_tiles(&test_image(70, 50), 32);
    let origins: Vec<(u32, u32)> = grid.tiles.iter().map(|t| (t.x, t.y)).collect();
    assert_eq!(
        origins,
        vec![(0, 0), (32, 0), (64, 0), (0, 32), (32, 32), (64, 32)]
    );
}

#[test]
fn every_orientation_is_undone_by_its_inverse() {
    let img = test_image(9, 5);
    for orientation in Orientation::ALL {
        let transformed = apply_orientation(img.clone(), orientation);
        if orientation.swaps_axes() {
            assert_eq!(transformed.dimensions(), (5, 9), "{orientation:?}");
        } else {
            assert_eq!(transformed.dimensions(), (9, 5), "{orientation:?}");
        }
        let restored = apply_orientation(transformed, orientation.inverse());
        assert_eq!(restored, img, "inverse failed for {orientation:?}");
    }
}

#[test]
fn rotate90_moves_top_left_to_top_right() {
    let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    let rotated = apply_orientation(img, Orientation::Rotate90);
    assert_eq!(rotated.get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
}

#[test]
fn load_tiled_corrects_orientation_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.png");
    let img = test_image(40, 25);
    img.save(&path).unwrap();

    // Metadata says rotate 90 CW; the grid must come out 25x40.
    let photo = photo_at(path, 40, 25, Orientation::Rotate90);
    let grid = load_tiled(&photo, 16).unwrap();
    assert_eq!((grid.width, grid.height), (25, 40));
    assert_eq!((grid.cols, grid.rows), (2, 3));
    assert_eq!(
        reassemble(&grid),
        apply_orientation(img, Orientation::Rotate90)
    );
}

#[test]
fn missing_file_is_a_file_access_error() {
    let photo = photo_at(
        PathBuf::from("/no/such/photo.png"),
        10,
        10,
        Orientation::Normal,
    );
    let err = load_tiled(&photo, 2048).unwrap_err();
    assert!(matches!(err, frameshow::error::Error::FileAccess { .. }));
}

#[test]
fn corrupt_file_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let photo = photo_at(path, 10, 10, Orientation::Normal);
    let err = load_tiled(&photo, 2048).unwrap_err();
    assert!(matches!(err, frameshow::error::Error::Decode { .. }));
}
