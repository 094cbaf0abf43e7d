use image::DynamicImage;
use std::path::Path;
use tracing::debug;

use crate::watermark::WatermarkError;

/// Save image as lossy WebP, alpha included
pub fn save(image: &DynamicImage, path: &Path, quality: f32) -> Result<(), WatermarkError> {
    let rgba_image = image.to_rgba8();
    let (width, height) = rgba_image.dimensions();

    let encoder = webp::Encoder::from_rgba(rgba_image.as_raw(), width, height);
    let encoded_webp = encoder.encode(quality.clamp(0.0, 100.0));
    std::fs::write(path, &*encoded_webp)?;

    debug!("WebP written: {} bytes", encoded_webp.len());
    Ok(())
}
