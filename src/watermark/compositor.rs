use ab_glyph::FontVec;
use image::{DynamicImage, Rgba, RgbaImage, imageops::FilterType};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::path::Path;
use tracing::{debug, warn};

use super::blend::blend_overlay;
use super::geometry::{resolve_anchor, rotated_bounds, scaled_dimensions};
use super::text::{load_font, render_text, text_alpha};
use super::{CompositedPreview, SourceImage, WatermarkConfig, WatermarkError};

/// Font size in pixels at scale 1.0.
pub const DEFAULT_FONT_SIZE: f32 = 20.0;

/// Draws text or image watermarks onto source images.
///
/// Holds the parsed font so repeated renders (slider drags, batch exports)
/// don't reparse it. Immutable once built and safe to share across threads.
pub struct Compositor {
    font: Option<FontVec>,
    base_font_size: f32,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    /// A compositor without a font. Text watermarks are skipped.
    pub fn new() -> Self {
        Self {
            font: None,
            base_font_size: DEFAULT_FONT_SIZE,
        }
    }

    pub fn with_font_file(path: &Path) -> Result<Self, WatermarkError> {
        let font = load_font(path)?;
        debug!("Loaded watermark font from {:?}", path);
        Ok(Self {
            font: Some(font),
            ..Self::new()
        })
    }

    /// Set the font size used at scale 1.0. Non-positive sizes are ignored.
    pub fn base_font_size(mut self, size: f32) -> Self {
        if size.is_finite() && size > 0.0 {
            self.base_font_size = size;
        }
        self
    }

    pub fn font_size(&self) -> f32 {
        self.base_font_size
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Composite the configured watermark onto `base`.
    ///
    /// An image watermark wins over text when both are set. With nothing to
    /// draw the result is a pixel-identical copy of `base`.
    pub fn composite(&self, base: &SourceImage, config: &WatermarkConfig) -> CompositedPreview {
        let Some((overlay, opacity)) = self.build_overlay(config) else {
            return CompositedPreview::new(base.image().clone());
        };

        let overlay = if config.rotation() != 0.0 {
            rotate_overlay(&overlay, config.rotation())
        } else {
            overlay
        };

        let mut canvas = base.image().to_rgba8();
        let anchor = resolve_anchor(
            config.position(),
            canvas.dimensions(),
            overlay.dimensions(),
        );
        debug!(
            "Compositing {}x{} watermark at {:?} ({})",
            overlay.width(),
            overlay.height(),
            anchor,
            config.position()
        );

        blend_overlay(&mut canvas, &overlay, anchor, opacity);

        CompositedPreview::new(DynamicImage::ImageRgba8(canvas))
    }

    /// Decode the file at `path` and composite onto it.
    pub fn composite_file(
        &self,
        path: &Path,
        config: &WatermarkConfig,
    ) -> Result<CompositedPreview, WatermarkError> {
        let source = SourceImage::open(path)?;
        Ok(self.composite(&source, config))
    }

    /// The watermark raster plus the opacity still to apply when blending.
    fn build_overlay(&self, config: &WatermarkConfig) -> Option<(RgbaImage, f32)> {
        if config.is_empty() {
            return None;
        }

        if let Some(mark) = config.image() {
            return Some((scale_image(mark, config.scale()), config.opacity()));
        }

        let Some(font) = &self.font else {
            warn!("No font loaded, skipping text watermark");
            return None;
        };

        let font_size = self.base_font_size * config.scale();
        let alpha = text_alpha(config.opacity());
        // Opacity already lives in the glyph alpha
        render_text(font, config.text(), font_size, alpha).map(|overlay| (overlay, 1.0))
    }
}

fn scale_image(mark: &RgbaImage, scale: f32) -> RgbaImage {
    let (width, height) = scaled_dimensions(mark.width(), mark.height(), scale);

    // Only resize if dimensions are different
    if (width, height) == mark.dimensions() {
        mark.clone()
    } else {
        image::imageops::resize(mark, width, height, FilterType::Lanczos3)
    }
}

/// Rotate counter-clockwise by `degrees` on a canvas grown to the rotated bounds.
fn rotate_overlay(overlay: &RgbaImage, degrees: f32) -> RgbaImage {
    let (bounds_w, bounds_h) = rotated_bounds(overlay.width(), overlay.height(), degrees);
    let side_w = bounds_w.max(overlay.width());
    let side_h = bounds_h.max(overlay.height());

    let mut padded = RgbaImage::from_pixel(side_w, side_h, Rgba([0, 0, 0, 0]));
    let offset_x = (side_w - overlay.width()) / 2;
    let offset_y = (side_h - overlay.height()) / 2;
    image::imageops::replace(&mut padded, overlay, offset_x as i64, offset_y as i64);

    // rotate_about_center turns clockwise for positive angles
    let rotated = rotate_about_center(
        &padded,
        (-degrees).to_radians(),
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    );

    let crop_x = (side_w - bounds_w) / 2;
    let crop_y = (side_h - bounds_h) / 2;
    image::imageops::crop_imm(&rotated, crop_x, crop_y, bounds_w, bounds_h).to_image()
}
