use super::Position;

/// Inset from the canvas edge used by the corner positions, in pixels.
pub const MARGIN: i64 = 10;

/// Footprint of a `width` x `height` watermark at `scale`.
///
/// Each side is rounded to the nearest pixel (halves away from zero) and
/// never drops below one pixel.
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let scale = scale as f64;
    let scaled = |side: u32| ((side as f64) * scale).round().max(1.0) as u32;
    (scaled(width), scaled(height))
}

/// Top-left pixel at which an overlay of `overlay` size is drawn on a `canvas`.
///
/// Anchors are signed: an overlay larger than the canvas ends up partly
/// off-canvas and gets clipped when blended.
pub fn resolve_anchor(position: Position, canvas: (u32, u32), overlay: (u32, u32)) -> (i64, i64) {
    let (canvas_w, canvas_h) = (canvas.0 as i64, canvas.1 as i64);
    let (overlay_w, overlay_h) = (overlay.0 as i64, overlay.1 as i64);

    let right = canvas_w - overlay_w - MARGIN;
    let bottom = canvas_h - overlay_h - MARGIN;

    match position {
        Position::TopLeft => (MARGIN, MARGIN),
        Position::TopRight => (right, MARGIN),
        Position::BottomLeft => (MARGIN, bottom),
        Position::BottomRight => (right, bottom),
        Position::Center => (
            (canvas_w - overlay_w).div_euclid(2),
            (canvas_h - overlay_h).div_euclid(2),
        ),
        Position::Custom { x, y } => (x, y),
    }
}

/// Bounding box of a `width` x `height` rectangle rotated by `degrees`.
pub fn rotated_bounds(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let radians = (degrees as f64).to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let (w, h) = (width as f64, height as f64);

    let bounds_w = (w * cos + h * sin).round().max(1.0) as u32;
    let bounds_h = (w * sin + h * cos).round().max(1.0) as u32;
    (bounds_w, bounds_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_two_doubles_footprint() {
        assert_eq!(scaled_dimensions(40, 20, 1.0), (40, 20));
        assert_eq!(scaled_dimensions(40, 20, 2.0), (80, 40));
        assert_eq!(scaled_dimensions(33, 17, 2.0), (66, 34));
    }

    #[test]
    fn test_scale_boundaries_round_to_nearest() {
        // 25 * 0.1 = 2.5 and 15 * 0.1 = 1.5 both round up
        assert_eq!(scaled_dimensions(25, 15, 0.1), (3, 2));
        assert_eq!(scaled_dimensions(24, 14, 0.1), (2, 1));
        assert_eq!(scaled_dimensions(100, 50, 0.1), (10, 5));
        assert_eq!(scaled_dimensions(100, 50, 3.0), (300, 150));
        assert_eq!(scaled_dimensions(7, 3, 3.0), (21, 9));
    }

    #[test]
    fn test_scaled_footprint_never_collapses() {
        assert_eq!(scaled_dimensions(3, 2, 0.1), (1, 1));
    }

    #[test]
    fn test_bottom_right_corner_sits_at_margin() {
        let (x, y) = resolve_anchor(Position::BottomRight, (600, 400), (120, 30));
        assert_eq!(x + 120, 600 - MARGIN);
        assert_eq!(y + 30, 400 - MARGIN);
    }

    #[test]
    fn test_corner_anchors() {
        let canvas = (200, 100);
        let overlay = (50, 20);
        assert_eq!(resolve_anchor(Position::TopLeft, canvas, overlay), (10, 10));
        assert_eq!(resolve_anchor(Position::TopRight, canvas, overlay), (140, 10));
        assert_eq!(resolve_anchor(Position::BottomLeft, canvas, overlay), (10, 70));
        assert_eq!(resolve_anchor(Position::BottomRight, canvas, overlay), (140, 70));
        assert_eq!(resolve_anchor(Position::Center, canvas, overlay), (75, 40));
        assert_eq!(
            resolve_anchor(Position::Custom { x: -5, y: 42 }, canvas, overlay),
            (-5, 42)
        );
    }

    #[test]
    fn test_oversized_overlay_goes_negative() {
        assert_eq!(
            resolve_anchor(Position::BottomRight, (50, 50), (100, 100)),
            (-60, -60)
        );
        assert_eq!(resolve_anchor(Position::Center, (50, 50), (101, 101)), (-26, -26));
    }

    #[test]
    fn test_rotated_bounds() {
        assert_eq!(rotated_bounds(40, 20, 0.0), (40, 20));
        assert_eq!(rotated_bounds(40, 20, 90.0), (20, 40));
        assert_eq!(rotated_bounds(40, 20, 180.0), (40, 20));
        // 45 degrees: (40 + 20) / sqrt(2) = 42.43
        assert_eq!(rotated_bounds(40, 20, 45.0), (42, 42));
    }
}
