use crate::Config;
use crate::watermark::SourceImage;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create output directory: {0}")]
    OutputDirectoryCreationFailed(#[from] std::io::Error),

    #[error("Font file missing: {0}")]
    FontMissing(String),

    #[error("Font file unreadable: {0}")]
    FontUnreadable(String),

    #[error("Watermark image unusable: {0}")]
    WatermarkImageUnusable(String),

    #[error("Invalid watermark position: {0}")]
    InvalidPosition(String),
}

impl StartupCheckError {
    /// Whether the tool can still do useful work with this problem present.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::OutputDirectoryCreationFailed(_)
                | StartupCheckError::WatermarkImageUnusable(_)
                | StartupCheckError::InvalidPosition(_)
        )
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    // Check output directory
    let output_dir = &config.export.output_directory;
    if !output_dir.exists() {
        info!("Output directory does not exist, creating: {:?}", output_dir);
        if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
            error!("Failed to create output directory: {}", e);
            errors.push(StartupCheckError::OutputDirectoryCreationFailed(e));
        } else {
            info!("Output directory created successfully");
        }
    } else {
        info!("Output directory exists: {:?}", output_dir);
    }

    // Text watermarks need a font; image watermarks don't
    let font_path = &config.font.path;
    if !font_path.exists() {
        warn!("Font file missing: {:?}", font_path);
        errors.push(StartupCheckError::FontMissing(
            font_path.display().to_string(),
        ));
    } else if let Err(e) = crate::watermark::text::load_font(font_path) {
        warn!("Font file {:?} could not be loaded: {}", font_path, e);
        errors.push(StartupCheckError::FontUnreadable(format!(
            "{}: {}",
            font_path.display(),
            e
        )));
    } else {
        info!("Font file found: {:?}", font_path);
    }

    // Check watermark image decodes
    if let Some(image_path) = &config.watermark.image {
        match SourceImage::open(image_path) {
            Ok(mark) => info!(
                "Watermark image {:?} loaded ({}x{})",
                image_path,
                mark.width(),
                mark.height()
            ),
            Err(e) => {
                error!("Watermark image {:?} is unusable: {}", image_path, e);
                errors.push(StartupCheckError::WatermarkImageUnusable(format!(
                    "{}: {}",
                    image_path.display(),
                    e
                )));
            }
        }
    }

    if let Err(e) = config.position() {
        error!("{}", e);
        errors.push(StartupCheckError::InvalidPosition(e.to_string()));
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
