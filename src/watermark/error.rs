use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to decode {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Refusing to overwrite source image: {}", .0.display())]
    WouldOverwrite(PathBuf),

    #[error("Another input already writes to {}", .0.display())]
    OutputCollision(PathBuf),

    #[error("Worker task failed: {0}")]
    Task(String),
}

impl WatermarkError {
    pub(crate) fn decode(origin: impl Into<String>, source: image::ImageError) -> Self {
        Self::Decode {
            origin: origin.into(),
            source,
        }
    }
}
