use image::{DynamicImage, GenericImageView, RgbaImage, imageops::FilterType};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::WatermarkError;

pub const DEFAULT_TEXT: &str = "My Watermark";
pub const DEFAULT_SCALE: f32 = 1.0;
pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 3.0;
pub const DEFAULT_OPACITY: f32 = 0.5;

/// Where the watermark is placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
    /// Explicit top-left corner of the watermark, in canvas pixels.
    Custom { x: i64, y: i64 },
}

impl Position {
    pub const NAMES: [&'static str; 6] = [
        "top-left",
        "top-right",
        "bottom-left",
        "bottom-right",
        "center",
        "custom",
    ];

    /// Build a position from its textual name plus the coordinates used by `custom`.
    pub fn from_parts(name: &str, x: Option<i64>, y: Option<i64>) -> Result<Self, WatermarkError> {
        if name.trim().eq_ignore_ascii_case("custom") {
            return match (x, y) {
                (Some(x), Some(y)) => Ok(Position::Custom { x, y }),
                _ => Err(WatermarkError::InvalidConfig(
                    "custom position requires both x and y coordinates".to_string(),
                )),
            };
        }
        name.parse()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
            Position::Center => "center",
            Position::Custom { .. } => "custom",
        }
    }
}

impl FromStr for Position {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "top-left" => Ok(Position::TopLeft),
            "top-right" => Ok(Position::TopRight),
            "bottom-left" => Ok(Position::BottomLeft),
            "bottom-right" => Ok(Position::BottomRight),
            "center" | "centre" => Ok(Position::Center),
            "custom" => Err(WatermarkError::InvalidConfig(
                "custom position requires both x and y coordinates".to_string(),
            )),
            _ => Err(WatermarkError::InvalidConfig(format!(
                "unknown position '{}', expected one of: {}",
                s,
                Position::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Custom { x, y } => write!(f, "custom({}, {})", x, y),
            other => f.write_str(other.name()),
        }
    }
}

pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        DEFAULT_SCALE
    }
}

pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        DEFAULT_OPACITY
    }
}

/// Normalize an angle in degrees into [0, 360).
pub fn normalize_rotation(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Snapshot of everything that decides how a watermark is drawn.
///
/// Fields are private so the ranges hold for every value in circulation;
/// edits go through the `with_*` functions, which return a new snapshot.
#[derive(Debug, Clone)]
pub struct WatermarkConfig {
    text: String,
    image: Option<Arc<RgbaImage>>,
    scale: f32,
    opacity: f32,
    position: Position,
    rotation: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            image: None,
            scale: DEFAULT_SCALE,
            opacity: DEFAULT_OPACITY,
            position: Position::default(),
            rotation: 0.0,
        }
    }
}

impl WatermarkConfig {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_deref()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self
        }
    }

    pub fn with_image(self, image: RgbaImage) -> Self {
        Self {
            image: Some(Arc::new(image)),
            ..self
        }
    }

    pub fn without_image(self) -> Self {
        Self {
            image: None,
            ..self
        }
    }

    pub fn with_scale(self, scale: f32) -> Self {
        Self {
            scale: clamp_scale(scale),
            ..self
        }
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            opacity: clamp_opacity(opacity),
            ..self
        }
    }

    pub fn with_position(self, position: Position) -> Self {
        Self { position, ..self }
    }

    pub fn with_rotation(self, degrees: f32) -> Self {
        Self {
            rotation: normalize_rotation(degrees),
            ..self
        }
    }

    /// True when neither text nor an image would be drawn.
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.text.is_empty()
    }
}

/// A decoded raster, optionally remembering the file it came from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
    path: Option<PathBuf>,
}

impl SourceImage {
    pub fn open(path: &Path) -> Result<Self, WatermarkError> {
        let reader = image::ImageReader::open(path)?.with_guessed_format()?;
        let image = reader
            .decode()
            .map_err(|e| WatermarkError::decode(path.display().to_string(), e))?;

        Ok(Self {
            image,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WatermarkError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| WatermarkError::decode("in-memory image", e))?;
        Ok(Self { image, path: None })
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self { image, path: None }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Result of compositing a watermark onto a [`SourceImage`].
#[derive(Debug, Clone)]
pub struct CompositedPreview {
    image: DynamicImage,
}

impl CompositedPreview {
    pub(crate) fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Downscale to fit a viewport, keeping the aspect ratio. Never upscales.
    pub fn fit_within(&self, max_width: u32, max_height: u32) -> DynamicImage {
        let (width, height) = self.image.dimensions();
        if width <= max_width && height <= max_height {
            return self.image.clone();
        }
        self.image
            .resize(max_width.max(1), max_height.max(1), FilterType::Lanczos3)
    }
}
