//! Tiled image loading: decode, orientation-correct, and slice oversized
//! photos into renderer-sized tiles.
//!
//! Tiling exists solely to respect the renderer's maximum single-texture
//! size; it never resamples pixels.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::RgbaImage;
use tracing::debug;

use crate::error::Error;
use crate::meta::{Orientation, Photo};

/// Default maximum edge length for a single tile, in pixels.
pub const MAX_TILE: u32 = 2048;

/// One tile of a corrected image: its origin within the full buffer and its
/// RGBA8 pixels.
#[derive(Debug, Clone)]
pub struct Tile {
    /// X offset of this tile's top-left corner in the corrected buffer.
    pub x: u32,
    /// Y offset of this tile's top-left corner in the corrected buffer.
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A decoded, orientation-corrected image as a row-major grid of tiles.
#[derive(Debug, Clone)]
pub struct TileGrid {
    /// Corrected (display) width of the whole image.
    pub width: u32,
    /// Corrected (display) height of the whole image.
    pub height: u32,
    pub cols: u32,
    pub rows: u32,
    /// Tiles in row-major order: y-major, then x.
    pub tiles: Vec<Tile>,
}

/// Decode one photo, apply its orientation transform, and slice the result
/// into tiles no larger than `max_tile` on either edge.
///
/// # Errors
/// `Error::FileAccess` when the file cannot be opened or read,
/// `Error::Decode` when the pixel stream is corrupt or unsupported.
pub fn load_tiled(photo: &Photo, max_tile: u32) -> Result<TileGrid, Error> {
    let file = File::open(&photo.path).map_err(|source| Error::FileAccess {
        path: photo.path.clone(),
        source,
    })?;
    let reader = image::ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(|source| Error::FileAccess {
            path: photo.path.clone(),
            source,
        })?;
    let decoded = reader.decode().map_err(|source| Error::Decode {
        path: photo.path.clone(),
        source,
    })?;

    let corrected = apply_orientation(decoded.to_rgba8(), photo.orientation);
    let grid = slice_into_tiles(&corrected, max_tile);
    debug!(
        path = %photo.path.display(),
        width = grid.width,
        height = grid.height,
        tiles = grid.tiles.len(),
        "photo decoded and tiled"
    );
    Ok(grid)
}

/// Apply an EXIF orientation transform, producing a new corrected buffer.
/// The input is consumed; the orientation code's visual inverse maps the
/// result back to the original.
#[must_use]
pub fn apply_orientation(img: RgbaImage, orientation: Orientation) -> RgbaImage {
    use image::imageops;
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => imageops::flip_horizontal(&img),
        Orientation::Rotate180 => imageops::rotate180(&img),
        Orientation::FlipVertical => imageops::flip_vertical(&img),
        // transpose (flip along the main diagonal): rotate90 + horizontal flip
        Orientation::Transpose => imageops::flip_horizontal(&imageops::rotate90(&img)),
        Orientation::Rotate90 => imageops::rotate90(&img),
        // transverse (flip along the anti-diagonal): rotate270 + horizontal flip
        Orientation::Transverse => imageops::flip_horizontal(&imageops::rotate270(&img)),
        Orientation::Rotate270 => imageops::rotate270(&img),
    }
}

/// Slice a corrected buffer into a row-major grid of tiles, each at most
/// `max_tile` on either edge. Trailing row/column tiles may be smaller.
#[must_use]
pub fn slice_into_tiles(img: &RgbaImage, max_tile: u32) -> TileGrid {
    let (width, height) = img.dimensions();
    let max_tile = max_tile.max(1);
    let cols = width.div_ceil(max_tile).max(1);
    let rows = height.div_ceil(max_tile).max(1);

    let mut tiles = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let x = col * max_tile;
            let y = row * max_tile;
            let tile_w = max_tile.min(width - x).max(1);
            let tile_h = max_tile.min(height - y).max(1);
            let view = image::imageops::crop_imm(img, x, y, tile_w, tile_h).to_image();
            tiles.push(Tile {
                x,
                y,
                width: tile_w,
                height: tile_h,
                pixels: view.into_raw(),
            });
        }
    }

    TileGrid {
        width,
        height,
        cols,
        rows,
        tiles,
    }
}

/// Rebuild the full corrected buffer from a grid. Used by tests to prove
/// tiling is lossless; tile placement during rendering follows the same
/// origins.
#[must_use]
pub fn reassemble(grid: &TileGrid) -> RgbaImage {
    let mut out = RgbaImage::new(grid.width.max(1), grid.height.max(1));
    for tile in &grid.tiles {
        let tile_img =
            RgbaImage::from_raw(tile.width, tile.height, tile.pixels.clone())
                .unwrap_or_else(|| RgbaImage::new(tile.width, tile.height));
        image::imageops::replace(&mut out, &tile_img, i64::from(tile.x), i64::from(tile.y));
    }
    out
}
