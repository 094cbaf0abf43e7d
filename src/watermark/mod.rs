// Watermark module - compositing text and image watermarks onto rasters
pub mod blend;
mod compositor;
mod error;
pub mod geometry;
pub mod text;
mod types;

// Re-export public items
pub use compositor::{Compositor, DEFAULT_FONT_SIZE};
pub use error::WatermarkError;
pub use geometry::MARGIN;
pub use types::*;
