use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use watermark_studio::{
    Config,
    export::{export_batch, is_same_file},
    formats,
    inputs::collect_images,
    session::{Command, PREVIEW_SIZE, Session},
    startup_checks,
    watermark::WatermarkError,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "watermark.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watermark a single image and write the preview
    Preview {
        input: PathBuf,

        /// Where to write the preview (format follows the extension)
        #[arg(short, long)]
        output: PathBuf,

        /// Shrink the preview to fit WIDTHxHEIGHT, e.g. 600x600
        #[arg(long, value_parser = parse_size)]
        fit: Option<(u32, u32)>,

        #[command(flatten)]
        watermark: WatermarkArgs,
    },

    /// Watermark every image in the given files and directories
    Export {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Number of images processed at once
        #[arg(long)]
        jobs: Option<usize>,

        #[command(flatten)]
        watermark: WatermarkArgs,
    },

    /// Check font, watermark image and output directory
    Check,
}

/// Overrides for the `[watermark]` and `[font]` config sections
#[derive(Args, Debug, Default)]
struct WatermarkArgs {
    #[arg(long)]
    text: Option<String>,

    /// Image to use as the watermark instead of text
    #[arg(long)]
    image: Option<PathBuf>,

    #[arg(long)]
    scale: Option<f32>,

    #[arg(long)]
    opacity: Option<f32>,

    /// top-left, top-right, bottom-left, bottom-right, center or custom
    #[arg(long)]
    position: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    x: Option<i64>,

    #[arg(long, allow_hyphen_values = true)]
    y: Option<i64>,

    /// Counter-clockwise rotation in degrees
    #[arg(long, allow_hyphen_values = true)]
    rotation: Option<f32>,

    #[arg(long)]
    font: Option<PathBuf>,
}

impl WatermarkArgs {
    fn apply_to(self, config: &mut Config) {
        let watermark = &mut config.watermark;
        if let Some(text) = self.text {
            watermark.text = text;
        }
        if let Some(image) = self.image {
            watermark.image = Some(image);
        }
        if let Some(scale) = self.scale {
            watermark.scale = scale;
        }
        if let Some(opacity) = self.opacity {
            watermark.opacity = opacity;
        }
        if let Some(position) = self.position {
            watermark.position = position;
        }
        if self.x.is_some() {
            watermark.x = self.x;
        }
        if self.y.is_some() {
            watermark.y = self.y;
        }
        if let Some(rotation) = self.rotation {
            watermark.rotation = rotation;
        }
        if let Some(font) = self.font {
            config.font.path = font;
        }
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: u32 = width.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let height: u32 = height.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    if width == 0 || height == 0 {
        return Err("width and height must be positive".to_string());
    }
    Ok((width, height))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Preview {
            input,
            output,
            fit,
            watermark,
        } => {
            watermark.apply_to(&mut config);
            run_preview(config, input, output, fit)
        }
        Commands::Export {
            inputs,
            output_dir,
            recursive,
            jobs,
            watermark,
        } => {
            watermark.apply_to(&mut config);
            if let Some(output_dir) = output_dir {
                config.export.output_directory = output_dir;
            }
            if jobs.is_some() {
                config.export.concurrency = jobs;
            }
            config.export.recursive |= recursive;
            run_export(config, inputs).await
        }
        Commands::Check => run_checks(&config).await,
    }
}

fn run_preview(
    config: Config,
    input: PathBuf,
    output: PathBuf,
    fit: Option<(u32, u32)>,
) -> Result<(), Box<dyn std::error::Error>> {
    check_preview_target(&input, &output)?;

    let compositor = config.compositor();
    let mut session = Session::new(config.watermark_config()?);

    let (_, preview) =
        session.apply_and_render(Command::ImportImages(vec![input]), &compositor)?;
    let Some(preview) = preview else {
        return Err("Nothing was imported".into());
    };

    let (max_width, max_height) = fit.unwrap_or(PREVIEW_SIZE);
    let image = preview.fit_within(max_width, max_height);
    let encode = config.export_settings().encode;
    formats::save(&image, &output, &encode)?;

    info!(
        "Preview written to {:?} ({}x{})",
        output,
        image.width(),
        image.height()
    );
    Ok(())
}

fn check_preview_target(input: &Path, output: &Path) -> Result<(), WatermarkError> {
    if is_same_file(input, output) {
        return Err(WatermarkError::WouldOverwrite(input.to_path_buf()));
    }
    Ok(())
}

async fn run_export(config: Config, paths: Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let discovered = collect_images(&paths, config.export.recursive);
    if !discovered.skipped.is_empty() {
        warn!("Skipped {} paths that are not images", discovered.skipped.len());
    }
    if discovered.images.is_empty() {
        return Err("No images found to export".into());
    }

    let watermark = config.watermark_config()?;
    let compositor = Arc::new(config.compositor());
    let report = export_batch(
        discovered.images,
        config.export_settings(),
        compositor,
        watermark,
    )
    .await?;

    for failure in &report.failed {
        error!("{:?}: {}", failure.path, failure.error);
    }

    if report.is_success() {
        info!("Successfully processed {} images", report.written.len());
        Ok(())
    } else {
        Err(format!(
            "{} of {} images failed to export",
            report.failed.len(),
            report.attempted()
        )
        .into())
    }
}

async fn run_checks(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match startup_checks::perform_startup_checks(config).await {
        Ok(()) => {
            info!("All startup checks passed");
            Ok(())
        }
        Err(errors) => {
            for failure in &errors {
                error!("Startup check failed: {}", failure);
            }

            if errors.iter().any(|e| e.is_critical()) {
                Err("Critical startup check failed".into())
            } else {
                warn!("Non-critical startup checks failed, continuing");
                Ok(())
            }
        }
    }
}
