use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod export;
pub mod formats;
pub mod inputs;
pub mod session;
pub mod startup_checks;
pub mod watermark;

use export::{ExportSettings, default_concurrency};
use formats::{DEFAULT_JPEG_QUALITY, DEFAULT_WEBP_QUALITY, EncodeOptions};
use watermark::{
    Compositor, DEFAULT_FONT_SIZE, Position, SourceImage, WatermarkConfig, WatermarkError,
};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub watermark: WatermarkSettings,
    pub font: FontConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatermarkSettings {
    pub text: String,
    /// Image watermark; drawn instead of the text when set
    pub image: Option<PathBuf>,
    pub scale: f32,
    pub opacity: f32,
    pub position: String,
    /// Coordinates for `position = "custom"`
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub rotation: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FontConfig {
    pub path: PathBuf,
    pub size: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_directory: PathBuf,
    pub jpeg_quality: Option<u8>,
    pub webp_quality: Option<f32>,
    pub concurrency: Option<usize>,
    pub recursive: bool,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        let defaults = WatermarkConfig::default();
        Self {
            text: defaults.text().to_string(),
            image: None,
            scale: defaults.scale(),
            opacity: defaults.opacity(),
            position: defaults.position().name().to_string(),
            x: None,
            y: None,
            rotation: 0.0,
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("static/DejaVuSans.ttf"),
            size: DEFAULT_FONT_SIZE,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("watermarked"),
            jpeg_quality: Some(DEFAULT_JPEG_QUALITY),
            webp_quality: Some(DEFAULT_WEBP_QUALITY),
            concurrency: None,
            recursive: false,
        }
    }
}

impl Config {
    /// Load from a TOML file, falling back to defaults when it doesn't exist.
    pub fn load(path: &Path) -> Result<Self, WatermarkError> {
        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!("Configuration loaded from: {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, WatermarkError> {
        toml_edit::de::from_str::<Config>(content)
            .map_err(|e| WatermarkError::InvalidConfig(e.to_string()))
    }

    pub fn position(&self) -> Result<Position, WatermarkError> {
        Position::from_parts(&self.watermark.position, self.watermark.x, self.watermark.y)
    }

    /// Build the watermark snapshot, loading the watermark image if one is configured.
    pub fn watermark_config(&self) -> Result<WatermarkConfig, WatermarkError> {
        let settings = &self.watermark;
        let mut config = WatermarkConfig::default()
            .with_text(settings.text.clone())
            .with_scale(settings.scale)
            .with_opacity(settings.opacity)
            .with_position(self.position()?)
            .with_rotation(settings.rotation);

        if let Some(image_path) = &settings.image {
            let mark = SourceImage::open(image_path)?;
            config = config.with_image(mark.image().to_rgba8());
        }

        Ok(config)
    }

    /// Build the compositor. A missing or unreadable font only disables text.
    pub fn compositor(&self) -> Compositor {
        let compositor = if self.font.path.exists() {
            match Compositor::with_font_file(&self.font.path) {
                Ok(compositor) => compositor,
                Err(e) => {
                    warn!("Failed to load font {:?}: {}", self.font.path, e);
                    Compositor::new()
                }
            }
        } else {
            warn!(
                "Font file not found at {:?}, text watermarks are disabled",
                self.font.path
            );
            Compositor::new()
        };
        compositor.base_font_size(self.font.size)
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            output_directory: self.export.output_directory.clone(),
            concurrency: self
                .export
                .concurrency
                .filter(|&n| n > 0)
                .unwrap_or_else(default_concurrency),
            encode: EncodeOptions {
                jpeg_quality: self.export.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY),
                webp_quality: self.export.webp_quality.unwrap_or(DEFAULT_WEBP_QUALITY),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_watermark_defaults() {
        let config = Config::default();
        let watermark = config.watermark_config().unwrap();
        assert_eq!(watermark.text(), "My Watermark");
        assert_eq!(watermark.scale(), 1.0);
        assert_eq!(watermark.opacity(), 0.5);
        assert_eq!(watermark.position(), Position::BottomRight);
        assert_eq!(config.font.size, 20.0);
        assert_eq!(config.export.output_directory, PathBuf::from("watermarked"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
[watermark]
text = "Studio"
opacity = 0.8
position = "top-left"

[export]
output_directory = "out"
jpeg_quality = 80
concurrency = 2
"#,
        )
        .unwrap();

        let watermark = config.watermark_config().unwrap();
        assert_eq!(watermark.text(), "Studio");
        assert_eq!(watermark.opacity(), 0.8);
        assert_eq!(watermark.scale(), 1.0);
        assert_eq!(watermark.position(), Position::TopLeft);

        let settings = config.export_settings();
        assert_eq!(settings.output_directory, PathBuf::from("out"));
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.encode.jpeg_quality, 80);
        assert_eq!(settings.encode.webp_quality, DEFAULT_WEBP_QUALITY);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = Config::from_toml("[watermark]\nscale = 12.0\nopacity = 3.0\n").unwrap();
        let watermark = config.watermark_config().unwrap();
        assert_eq!(watermark.scale(), 3.0);
        assert_eq!(watermark.opacity(), 1.0);
    }

    #[test]
    fn test_custom_position_needs_coordinates() {
        let config = Config::from_toml("[watermark]\nposition = \"custom\"\nx = 12\n").unwrap();
        assert!(matches!(
            config.watermark_config(),
            Err(WatermarkError::InvalidConfig(_))
        ));

        let config =
            Config::from_toml("[watermark]\nposition = \"custom\"\nx = 12\ny = 34\n").unwrap();
        assert_eq!(config.position().unwrap(), Position::Custom { x: 12, y: 34 });
    }

    #[test]
    fn test_malformed_toml_is_invalid_config() {
        let result = Config::from_toml("[watermark\ntext = ");
        assert!(matches!(result, Err(WatermarkError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.watermark.position, "bottom-right");
    }

    #[test]
    fn test_missing_font_yields_textless_compositor() {
        let mut config = Config::default();
        config.font.path = PathBuf::from("/definitely/not/here.ttf");
        config.font.size = 32.0;
        let compositor = config.compositor();
        assert!(!compositor.has_font());
        assert_eq!(compositor.font_size(), 32.0);
    }
}
