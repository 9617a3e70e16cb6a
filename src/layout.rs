//! Layout math: uniform scale + translation for slide images, their tiles,
//! and overlay text anchors. Pure functions over pixel dimensions; the
//! renderer converts the resulting rects to NDC for the quad pipeline.

/// Default margin, in pixels, between overlay text and the nearest edge.
pub const OVERLAY_MARGIN: f32 = 24.0;

/// A photo's placement on the display: uniform scale plus the top-left
/// corner and scaled extent of its destination rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Corner of a photo's destination rect an overlay is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCorner {
    BottomLeft,
    BottomRight,
}

/// Largest uniform scale at which `img` fits entirely within `bounds`.
#[must_use]
pub fn fit_scale(img_w: u32, img_h: u32, bounds_w: f32, bounds_h: f32) -> f32 {
    if img_w == 0 || img_h == 0 {
        return 1.0;
    }
    (bounds_w / img_w as f32).min(bounds_h / img_h as f32)
}

/// Scale a single photo to the largest size fitting the display, centered
/// on both axes.
#[must_use]
pub fn place_single(img_w: u32, img_h: u32, display_w: u32, display_h: u32) -> Placement {
    place_in_region(img_w, img_h, 0.0, 0.0, display_w as f32, display_h as f32)
}

/// Place two portraits side by side. Each photo is scaled independently to
/// fit its own half of the display width and the full height, then centered
/// within its own half; the pair shares neither a scale nor a flush midline.
#[must_use]
pub fn place_pair(
    left: (u32, u32),
    right: (u32, u32),
    display_w: u32,
    display_h: u32,
) -> (Placement, Placement) {
    let half_w = display_w as f32 / 2.0;
    let full_h = display_h as f32;
    let left_placed = place_in_region(left.0, left.1, 0.0, 0.0, half_w, full_h);
    let right_placed = place_in_region(right.0, right.1, half_w, 0.0, half_w, full_h);
    (left_placed, right_placed)
}

fn place_in_region(
    img_w: u32,
    img_h: u32,
    region_x: f32,
    region_y: f32,
    region_w: f32,
    region_h: f32,
) -> Placement {
    let scale = fit_scale(img_w, img_h, region_w, region_h);
    let width = img_w as f32 * scale;
    let height = img_h as f32 * scale;
    Placement {
        x: region_x + (region_w - width) / 2.0,
        y: region_y + (region_h - height) / 2.0,
        width,
        height,
        scale,
    }
}

/// Destination rect of one tile under a photo placement, in display pixels.
/// `tile_x`/`tile_y` are the tile's origin in the corrected buffer.
#[must_use]
pub fn tile_rect(
    placement: &Placement,
    tile_x: u32,
    tile_y: u32,
    tile_w: u32,
    tile_h: u32,
) -> (f32, f32, f32, f32) {
    let s = placement.scale;
    (
        placement.x + tile_x as f32 * s,
        placement.y + tile_y as f32 * s,
        tile_w as f32 * s,
        tile_h as f32 * s,
    )
}

/// Anchor for a single-photo slide's date overlay: the display's own
/// bottom-left corner.
#[must_use]
pub fn display_overlay_anchor(display_h: u32, text_h: f32, margin: f32) -> (f32, f32) {
    (margin, display_h as f32 - margin - text_h)
}

/// Anchor for a paired slide's date overlay: the named corner of that
/// photo's own destination rect.
#[must_use]
pub fn placement_overlay_anchor(
    placement: &Placement,
    corner: OverlayCorner,
    text_w: f32,
    text_h: f32,
    margin: f32,
) -> (f32, f32) {
    let y = placement.y + placement.height - margin - text_h;
    match corner {
        OverlayCorner::BottomLeft => (placement.x + margin, y),
        OverlayCorner::BottomRight => (placement.x + placement.width - margin - text_w, y),
    }
}

/// Convert a destination rect in display pixels to the NDC scale/offset the
/// quad vertex shader expects: `pos * scale + offset` for a unit quad.
#[must_use]
pub fn ndc_transform(
    rect: (f32, f32, f32, f32),
    display_w: u32,
    display_h: u32,
) -> [f32; 4] {
    let dw = (display_w as f32).max(1.0);
    let dh = (display_h as f32).max(1.0);
    let (x, y, w, h) = rect;
    let sx = w / dw;
    let sy = h / dh;
    let tx = (x + w / 2.0) / dw * 2.0 - 1.0;
    let ty = 1.0 - (y + h / 2.0) / dh * 2.0;
    [sx, sy, tx, ty]
}
