//! Editing session: the state behind a preview pane.
//!
//! Every user action is a [`Command`]. [`Session::apply`] turns it into a new
//! state plus a [`SessionEvent`] describing what changed, and the caller
//! re-renders with [`Session::render`]. Config edits never touch the source
//! image; imports replace it wholesale.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::watermark::{
    CompositedPreview, Compositor, Position, SourceImage, WatermarkConfig, WatermarkError,
};

/// Width and height of the preview pane.
pub const PREVIEW_SIZE: (u32, u32) = (600, 600);

#[derive(Debug, Clone)]
pub enum Command {
    SetText(String),
    SetScale(f32),
    SetOpacity(f32),
    SetPosition(Position),
    SetRotation(f32),
    ImportImages(Vec<PathBuf>),
    ImportWatermarkImage(PathBuf),
    ClearWatermarkImage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ConfigChanged,
    ImageImported { path: PathBuf, count: usize },
    /// The command carried nothing to act on
    Unchanged,
}

#[derive(Debug, Default)]
pub struct Session {
    source: Option<SourceImage>,
    inputs: Vec<PathBuf>,
    config: WatermarkConfig,
}

impl Session {
    pub fn new(config: WatermarkConfig) -> Self {
        Self {
            source: None,
            inputs: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    /// The image shown in the preview, i.e. the first imported file.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Every imported file, in import order.
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Apply one command. On error the session is left exactly as it was.
    pub fn apply(&mut self, command: Command) -> Result<SessionEvent, WatermarkError> {
        debug!("Applying {:?}", command);

        let config = self.config.clone();
        let config = match command {
            Command::SetText(text) => config.with_text(text),
            Command::SetScale(scale) => config.with_scale(scale),
            Command::SetOpacity(opacity) => config.with_opacity(opacity),
            Command::SetPosition(position) => config.with_position(position),
            Command::SetRotation(degrees) => config.with_rotation(degrees),
            Command::ClearWatermarkImage => config.without_image(),
            Command::ImportWatermarkImage(path) => {
                let mark = load_watermark_image(&path)?;
                config.with_image(mark)
            }
            Command::ImportImages(paths) => return self.import_images(paths),
        };

        self.config = config;
        Ok(SessionEvent::ConfigChanged)
    }

    fn import_images(&mut self, paths: Vec<PathBuf>) -> Result<SessionEvent, WatermarkError> {
        let Some(first) = paths.first() else {
            return Ok(SessionEvent::Unchanged);
        };

        let source = SourceImage::open(first).inspect_err(|e| {
            warn!("Import aborted, could not load {:?}: {}", first, e);
        })?;

        info!(
            "Imported {} images, previewing {:?} ({}x{})",
            paths.len(),
            first,
            source.width(),
            source.height()
        );

        let path = first.clone();
        let count = paths.len();
        self.source = Some(source);
        self.inputs = paths;

        Ok(SessionEvent::ImageImported { path, count })
    }

    /// Composite the current config onto the preview source, if there is one.
    pub fn render(&self, compositor: &Compositor) -> Option<CompositedPreview> {
        self.source
            .as_ref()
            .map(|source| compositor.composite(source, &self.config))
    }

    /// Apply a command and re-render, the way the preview pane reacts to input.
    pub fn apply_and_render(
        &mut self,
        command: Command,
        compositor: &Compositor,
    ) -> Result<(SessionEvent, Option<CompositedPreview>), WatermarkError> {
        let event = self.apply(command)?;
        Ok((event, self.render(compositor)))
    }
}

fn load_watermark_image(path: &Path) -> Result<image::RgbaImage, WatermarkError> {
    let source = SourceImage::open(path).inspect_err(|e| {
        warn!("Could not load watermark image {:?}: {}", path, e);
    })?;
    Ok(source.image().to_rgba8())
}
