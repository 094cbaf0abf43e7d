use image::{Rgba, RgbaImage};

/// Alpha-composite `overlay` onto `base` with its top-left corner at `anchor`.
///
/// Each overlay pixel contributes `a = alpha / 255 * opacity`. Color channels
/// become `base * (1 - a) + overlay * a` and the result alpha is the usual
/// "over" coverage. Pixels falling outside `base` are clipped.
pub fn blend_overlay(base: &mut RgbaImage, overlay: &RgbaImage, anchor: (i64, i64), opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity == 0.0 {
        return;
    }

    let (base_w, base_h) = (base.width() as i64, base.height() as i64);
    let (anchor_x, anchor_y) = anchor;

    // Only walk the part of the overlay that lands on the canvas. Anchors can
    // be any i64, so the bounds saturate instead of overflowing.
    let x_start = anchor_x.saturating_neg().clamp(0, overlay.width() as i64);
    let y_start = anchor_y.saturating_neg().clamp(0, overlay.height() as i64);
    let x_end = base_w.saturating_sub(anchor_x).clamp(0, overlay.width() as i64);
    let y_end = base_h.saturating_sub(anchor_y).clamp(0, overlay.height() as i64);

    for oy in y_start..y_end {
        for ox in x_start..x_end {
            let mark = overlay.get_pixel(ox as u32, oy as u32);
            if mark[3] == 0 {
                continue;
            }
            let target = base.get_pixel_mut((anchor_x + ox) as u32, (anchor_y + oy) as u32);
            *target = blend_pixel(*target, *mark, opacity);
        }
    }
}

/// Blend a single overlay pixel over a base pixel.
pub fn blend_pixel(base: Rgba<u8>, mark: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let a = mark[3] as f32 / 255.0 * opacity;
    let mix = |under: u8, over: u8| -> u8 {
        (under as f32 * (1.0 - a) + over as f32 * a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let alpha = (255.0 * a + base[3] as f32 * (1.0 - a))
        .round()
        .clamp(0.0, 255.0) as u8;

    Rgba([mix(base[0], mark[0]), mix(base[1], mark[1]), mix(base[2], mark[2]), alpha])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_pixel_half_opacity() {
        let out = blend_pixel(Rgba([200, 100, 0, 255]), Rgba([0, 0, 255, 255]), 0.5);
        assert_eq!(out, Rgba([100, 50, 128, 255]));
    }

    #[test]
    fn test_blend_pixel_full_opacity_replaces() {
        let out = blend_pixel(Rgba([12, 34, 56, 255]), Rgba([200, 150, 100, 255]), 1.0);
        assert_eq!(out, Rgba([200, 150, 100, 255]));
    }

    #[test]
    fn test_transparent_mark_leaves_base() {
        let out = blend_pixel(Rgba([12, 34, 56, 255]), Rgba([200, 150, 100, 0]), 1.0);
        assert_eq!(out, Rgba([12, 34, 56, 255]));
    }

    #[test]
    fn test_blend_over_transparent_base_gains_alpha() {
        let out = blend_pixel(Rgba([0, 0, 0, 0]), Rgba([255, 255, 255, 255]), 0.5);
        assert_eq!(out[3], 128);
    }

    #[test]
    fn test_zero_opacity_is_noop() {
        let mut base = RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 255]));
        let before = base.clone();
        let overlay = RgbaImage::from_pixel(5, 5, Rgba([255, 255, 255, 255]));
        blend_overlay(&mut base, &overlay, (2, 2), 0.0);
        assert_eq!(base, before);
    }

    #[test]
    fn test_overlay_only_touches_footprint() {
        let mut base = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let overlay = RgbaImage::from_pixel(3, 2, Rgba([255, 255, 255, 255]));
        blend_overlay(&mut base, &overlay, (4, 5), 1.0);

        for (x, y, pixel) in base.enumerate_pixels() {
            let inside = (4..7).contains(&x) && (5..7).contains(&y);
            let expected = if inside {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            };
            assert_eq!(*pixel, expected, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_overlay_clipped_at_edges() {
        let mut base = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let overlay = RgbaImage::from_pixel(3, 3, Rgba([255, 0, 0, 255]));

        blend_overlay(&mut base, &overlay, (-2, -2), 1.0);
        assert_eq!(*base.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*base.get_pixel(1, 0), Rgba([0, 0, 0, 255]));

        blend_overlay(&mut base, &overlay, (3, 3), 1.0);
        assert_eq!(*base.get_pixel(3, 3), Rgba([255, 0, 0, 255]));
        assert_eq!(*base.get_pixel(2, 3), Rgba([0, 0, 0, 255]));

        // Entirely off-canvas
        let before = base.clone();
        blend_overlay(&mut base, &overlay, (10, -10), 1.0);
        assert_eq!(base, before);
    }

    #[test]
    fn test_extreme_anchors_leave_base_untouched() {
        let mut base = RgbaImage::from_pixel(20, 20, Rgba([7, 8, 9, 255]));
        let before = base.clone();
        let overlay = RgbaImage::from_pixel(5, 5, Rgba([255, 255, 255, 255]));

        for anchor in [
            (i64::MIN, 0),
            (0, i64::MIN),
            (i64::MAX, 0),
            (0, i64::MAX),
            (i64::MIN, i64::MAX),
        ] {
            blend_overlay(&mut base, &overlay, anchor, 1.0);
            assert_eq!(base, before, "anchor {:?}", anchor);
        }
    }
}
