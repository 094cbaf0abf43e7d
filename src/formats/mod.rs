pub mod jpeg;
pub mod png;
pub mod webp;

use image::{DynamicImage, ImageFormat};
use std::path::Path;
use tracing::debug;

use crate::watermark::WatermarkError;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;
pub const DEFAULT_WEBP_QUALITY: f32 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    pub jpeg_quality: u8,
    pub webp_quality: f32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            webp_quality: DEFAULT_WEBP_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    /// Anything else the `image` crate can write (bmp, gif, tiff, ...).
    Other(ImageFormat),
}

impl OutputFormat {
    /// Pick the encoder from the file extension, keeping the source format.
    pub fn from_path(path: &Path) -> Result<Self, WatermarkError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .ok_or_else(|| WatermarkError::UnsupportedFormat(path.display().to_string()))?;

        match extension.as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            other => ImageFormat::from_extension(other)
                .map(OutputFormat::Other)
                .ok_or_else(|| WatermarkError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Save `image` to `path` in the format implied by its extension.
pub fn save(image: &DynamicImage, path: &Path, options: &EncodeOptions) -> Result<(), WatermarkError> {
    let format = OutputFormat::from_path(path)?;
    debug!("Saving {:?} as {:?}", path, format);

    match format {
        OutputFormat::Jpeg => jpeg::save(image, path, options.jpeg_quality),
        OutputFormat::Png => png::save(image, path),
        OutputFormat::WebP => webp::save(image, path, options.webp_quality),
        OutputFormat::Other(format) => {
            image.save_with_format(path, format)?;
            Ok(())
        }
    }
}
