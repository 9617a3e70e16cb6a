//! Layout math: letterboxed singles, independently scaled pairs, tile
//! rects, overlay anchors, and NDC conversion.

use frameshow::layout::{
    OVERLAY_MARGIN, OverlayCorner, Placement, display_overlay_anchor, fit_scale, ndc_transform,
    place_pair, place_single, placement_overlay_anchor, tile_rect,
};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 0.001
}

fn rect_close(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) {
    assert!(
        close(a.0, b.0) && close(a.1, b.1) && close(a.2, b.2) && close(a.3, b.3),
        "rect mismatch: {a:?} vs {b:?}"
    );
}

fn placement_rect(p: &Placement) -> (f32, f32, f32, f32) {
    (p.x, p.y, p.width, p.height)
}

#[test]
fn square_letterboxes_on_a_wide_display() {
    // 1000x1000 image on 1920x1080: scale = 1.08, centered horizontally.
    let p = place_single(1000, 1000, 1920, 1080);
    assert!(close(p.scale, 1.08));
    rect_close(placement_rect(&p), (420.0, 0.0, 1080.0, 1080.0));
}

#[test]
fn wide_image_letterboxes_vertically() {
    // 4000x2000 on 1920x1080: scale = 0.48, centered vertically.
    let p = place_single(4000, 2000, 1920, 1080);
    rect_close(placement_rect(&p), (0.0, 60.0, 1920.0, 960.0));
}

#[test]
fn oversized_scale_only_shrinks_never_distorts() {
    let p = place_single(300, 200, 1920, 1080);
    // Small images are scaled up uniformly to fit.
    assert!(close(p.scale, 1080.0 / 200.0));
    assert!(close(p.width / p.height, 1.5));
}

#[test]
fn pair_scales_each_half_independently() {
    // Halves are 960x1080. Left 1000x1500 -> scale 0.72; right 800x1600 ->
    // scale 0.675. Neither is forced to the other's scale.
    let (l, r) = place_pair((1000, 1500), (800, 1600), 1920, 1080);
    assert!(close(l.scale, 0.72));
    assert!(close(r.scale, 0.675));
    rect_close(placement_rect(&l), (120.0, 0.0, 720.0, 1080.0));
    rect_close(placement_rect(&r), (1170.0, 0.0, 540.0, 1080.0));
}

#[test]
fn pair_halves_never_overlap_the_midline() {
    let (l, r) = place_pair((900, 1600), (900, 1600), 1920, 1080);
    assert!(l.x + l.width <= 960.0 + 0.001);
    assert!(r.x >= 960.0 - 0.001);
}

#[test]
fn tile_rects_track_the_photo_placement() {
    let p = Placement {
        x: 100.0,
        y: 50.0,
        width: 2560.0,
        height: 1500.0,
        scale: 0.5,
    };
    // A tile at (2048, 0) of 512x512 lands at placement + origin * scale.
    rect_close(
        tile_rect(&p, 2048, 0, 512, 512),
        (100.0 + 1024.0, 50.0, 256.0, 256.0),
    );
    rect_close(tile_rect(&p, 0, 2048, 64, 32), (100.0, 50.0 + 1024.0, 32.0, 16.0));
}

#[test]
fn single_overlay_anchors_to_display_bottom_left() {
    let (x, y) = display_overlay_anchor(1080, 30.0, OVERLAY_MARGIN);
    assert!(close(x, 24.0));
    assert!(close(y, 1080.0 - 24.0 - 30.0));
}

#[test]
fn pair_overlays_anchor_to_their_own_corners() {
    let p = Placement {
        x: 120.0,
        y: 0.0,
        width: 720.0,
        height: 1080.0,
        scale: 0.72,
    };
    let (lx, ly) = placement_overlay_anchor(&p, OverlayCorner::BottomLeft, 200.0, 30.0, 24.0);
    assert!(close(lx, 144.0));
    assert!(close(ly, 1080.0 - 24.0 - 30.0));

    let (rx, ry) = placement_overlay_anchor(&p, OverlayCorner::BottomRight, 200.0, 30.0, 24.0);
    assert!(close(rx, 120.0 + 720.0 - 24.0 - 200.0));
    assert!(close(ry, ly));
}

#[test]
fn ndc_transform_maps_display_rects_to_clip_space() {
    // Full-screen rect: identity transform.
    assert_eq!(ndc_transform((0.0, 0.0, 1920.0, 1080.0), 1920, 1080), [1.0, 1.0, 0.0, 0.0]);
    // Left half: half width, shifted left.
    let left = ndc_transform((0.0, 0.0, 960.0, 1080.0), 1920, 1080);
    assert!(close(left[0], 0.5) && close(left[2], -0.5));
    // Top-left quarter sits up and left in NDC (y up).
    let q = ndc_transform((0.0, 0.0, 960.0, 540.0), 1920, 1080);
    assert!(close(q[3], 0.5));
}

#[test]
fn degenerate_dimensions_do_not_divide_by_zero() {
    assert!(close(fit_scale(0, 100, 1920.0, 1080.0), 1.0));
    let t = ndc_transform((0.0, 0.0, 10.0, 10.0), 0, 0);
    assert!(t.iter().all(|v| v.is_finite()));
}
