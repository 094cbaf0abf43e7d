use ab_glyph::{FontVec, PxScale};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;

use super::WatermarkError;

/// Glyph alpha for a given opacity: `round(255 * opacity)`, within [0, 255].
pub fn text_alpha(opacity: f32) -> u8 {
    if !opacity.is_finite() {
        return 0;
    }
    (255.0 * opacity).round().clamp(0.0, 255.0) as u8
}

pub fn load_font(path: &Path) -> Result<FontVec, WatermarkError> {
    let font_data = std::fs::read(path)?;
    parse_font(font_data)
}

pub fn parse_font(font_data: Vec<u8>) -> Result<FontVec, WatermarkError> {
    FontVec::try_from_vec(font_data)
        .map_err(|_| WatermarkError::Font("Failed to parse font".to_string()))
}

/// Render `text` in white onto a transparent overlay sized to the text.
///
/// Glyph coverage is multiplied into `alpha`, so the overlay already carries
/// the watermark opacity. Returns `None` when the text has no extent.
pub fn render_text(font: &FontVec, text: &str, font_size: f32, alpha: u8) -> Option<RgbaImage> {
    let scale = PxScale::from(font_size);
    let (text_width, text_height) = text_size(scale, font, text);
    if text_width == 0 || text_height == 0 {
        return None;
    }

    // Draw coverage into a mask first so the fill stays pure white
    let mut coverage = GrayImage::new(text_width, text_height);
    draw_text_mut(&mut coverage, Luma([alpha]), 0, 0, scale, font, text);

    let overlay = RgbaImage::from_fn(text_width, text_height, |x, y| {
        Rgba([255, 255, 255, coverage.get_pixel(x, y)[0]])
    });

    Some(overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::test_support::test_font;

    #[test]
    fn test_text_alpha_monotonic() {
        let mut previous = 0u8;
        for step in 0..=100 {
            let opacity = step as f32 / 100.0;
            let alpha = text_alpha(opacity);
            assert!(alpha >= previous, "alpha dropped at opacity {}", opacity);
            previous = alpha;
        }
        assert_eq!(text_alpha(0.0), 0);
        assert_eq!(text_alpha(0.5), 128);
        assert_eq!(text_alpha(1.0), 255);
    }

    #[test]
    fn test_text_alpha_clamped() {
        assert_eq!(text_alpha(-1.0), 0);
        assert_eq!(text_alpha(2.0), 255);
        assert_eq!(text_alpha(f32::NAN), 0);
    }

    #[test]
    fn test_parse_font_rejects_garbage() {
        let result = parse_font(b"not a font".to_vec());
        assert!(matches!(result, Err(WatermarkError::Font(_))));
    }

    #[test]
    fn test_render_text_is_white_with_bounded_alpha() {
        let Some(font) = test_font() else {
            // Can't test without a font file
            return;
        };

        let overlay = render_text(&font, "Hello", 20.0, 128).expect("text should have extent");
        assert!(overlay.width() > 0 && overlay.height() > 0);

        let mut inked = 0;
        for pixel in overlay.pixels() {
            assert_eq!(&pixel.0[..3], &[255, 255, 255]);
            assert!(pixel[3] <= 128);
            if pixel[3] > 0 {
                inked += 1;
            }
        }
        assert!(inked > 0, "no glyph pixels were drawn");
    }

    #[test]
    fn test_render_text_grows_with_font_size() {
        let Some(font) = test_font() else {
            return;
        };

        let small = render_text(&font, "Scale", 20.0, 255).unwrap();
        let large = render_text(&font, "Scale", 40.0, 255).unwrap();
        assert!(large.width() > small.width());
        assert!(large.height() > small.height());
    }
}
