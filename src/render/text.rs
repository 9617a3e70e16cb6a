//! CPU text rasterization for overlays.
//!
//! Renders a single line into an RGBA buffer that the viewer uploads as a
//! texture quad; no glyph atlas, since overlays change at most once per
//! slide.

use anyhow::{Context, Result};
use ab_glyph::{Font, FontVec, Glyph, GlyphId, PxScale, ScaleFont, point};

/// A rasterized line of text, straight-alpha RGBA8.
#[derive(Debug, Clone)]
pub struct TextRaster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A loaded overlay font.
pub struct OverlayFont {
    font: FontVec,
}

impl OverlayFont {
    /// Load a sans-serif face from the system font database.
    ///
    /// # Errors
    /// Fails when no system font is available or the face cannot be parsed.
    pub fn from_system() -> Result<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let query = fontdb::Query {
            families: &[fontdb::Family::SansSerif],
            ..fontdb::Query::default()
        };
        let id = db.query(&query).context("no system sans-serif font found")?;
        let font = db
            .with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index)
            })
            .context("reading font face data")?
            .context("parsing font face")?;
        Ok(Self { font })
    }

    /// Rasterize one line at the given pixel height and RGBA color.
    #[must_use]
    pub fn rasterize(&self, text: &str, px: f32, color: [u8; 4]) -> TextRaster {
        let scaled = self.font.as_scaled(PxScale::from(px));

        let mut glyphs: Vec<Glyph> = Vec::new();
        let mut caret = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let mut glyph = scaled.scaled_glyph(ch);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, glyph.id);
            }
            glyph.position = point(caret, scaled.ascent());
            caret += scaled.h_advance(glyph.id);
            prev = Some(glyph.id);
            glyphs.push(glyph);
        }

        let width = (caret.ceil() as u32).max(1);
        let height = (scaled.height().ceil() as u32).max(1);
        let mut pixels = vec![0u8; (width * height * 4) as usize];

        for glyph in glyphs {
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = gx as i64 + bounds.min.x as i64;
                let y = gy as i64 + bounds.min.y as i64;
                if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                    return;
                }
                let idx = ((y as u32 * width + x as u32) * 4) as usize;
                let alpha = (coverage * f32::from(color[3])).round().clamp(0.0, 255.0) as u8;
                // Overlapping outlines keep the strongest coverage.
                if alpha > pixels[idx + 3] {
                    pixels[idx] = color[0];
                    pixels[idx + 1] = color[1];
                    pixels[idx + 2] = color[2];
                    pixels[idx + 3] = alpha;
                }
            });
        }

        TextRaster {
            width,
            height,
            pixels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterizes_visible_pixels_when_a_font_exists() {
        // Headless CI images may have no fonts installed; the overlay is
        // optional there, so only assert when a face is found.
        let Ok(font) = OverlayFont::from_system() else {
            return;
        };
        let raster = font.rasterize("2021-06-01", 28.0, [255, 255, 255, 255]);
        assert!(raster.width > raster.height);
        assert_eq!(
            raster.pixels.len(),
            (raster.width * raster.height * 4) as usize
        );
        assert!(raster.pixels.chunks_exact(4).any(|px| px[3] > 0));
    }

    #[test]
    fn empty_text_yields_minimal_raster() {
        let Ok(font) = OverlayFont::from_system() else {
            return;
        };
        let raster = font.rasterize("", 28.0, [255, 255, 255, 255]);
        assert_eq!(raster.width, 1);
        assert!(raster.pixels.chunks_exact(4).all(|px| px[3] == 0));
    }
}
