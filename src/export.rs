use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::formats::{self, EncodeOptions};
use crate::watermark::{Compositor, WatermarkConfig, WatermarkError};

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub output_directory: PathBuf,
    /// Maximum number of images processed at once
    pub concurrency: usize,
    pub encode: EncodeOptions,
}

impl ExportSettings {
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: output_directory.into(),
            concurrency: default_concurrency(),
            encode: EncodeOptions::default(),
        }
    }
}

pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug)]
pub struct ExportFailure {
    pub path: PathBuf,
    pub error: WatermarkError,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    /// Output files written, in input order
    pub written: Vec<PathBuf>,
    pub failed: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Where the watermarked copy of `input` goes: same file name, new directory.
pub fn output_path_for(input: &Path, output_directory: &Path) -> Option<PathBuf> {
    input
        .file_name()
        .map(|file_name| output_directory.join(file_name))
}

/// Watermark one file and write the result, preserving its format.
pub fn export_one(
    input: &Path,
    settings: &ExportSettings,
    compositor: &Compositor,
    config: &WatermarkConfig,
) -> Result<PathBuf, WatermarkError> {
    let output = output_path_for(input, &settings.output_directory)
        .ok_or_else(|| WatermarkError::InvalidConfig(format!("{:?} has no file name", input)))?;

    if is_same_file(input, &output) {
        return Err(WatermarkError::WouldOverwrite(input.to_path_buf()));
    }

    // Fail on unsupported output formats before spending time decoding
    formats::OutputFormat::from_path(&output)?;

    let preview = compositor.composite_file(input, config)?;
    formats::save(preview.image(), &output, &settings.encode)?;

    debug!("Exported {:?} -> {:?}", input, output);
    Ok(output)
}

/// True when both paths name the same file on disk, or are equal if either is missing.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Watermark every input on the blocking pool, at most `concurrency` at a time.
///
/// A file that fails is recorded in the report and the batch moves on. Inputs
/// whose output path is already claimed by an earlier input fail with
/// `OutputCollision`. Only failing to create the output directory aborts the
/// whole run.
pub async fn export_batch(
    inputs: Vec<PathBuf>,
    settings: ExportSettings,
    compositor: Arc<Compositor>,
    config: WatermarkConfig,
) -> Result<ExportReport, WatermarkError> {
    tokio::fs::create_dir_all(&settings.output_directory).await?;

    info!(
        "Exporting {} images to {:?} ({} workers)",
        inputs.len(),
        settings.output_directory,
        settings.concurrency.max(1)
    );

    let semaphore = Arc::new(Semaphore::new(settings.concurrency.max(1)));
    let settings = Arc::new(settings);
    let config = Arc::new(config);
    let mut claimed = HashSet::new();
    let mut handles = Vec::with_capacity(inputs.len());

    for input in inputs {
        if let Some(output) = output_path_for(&input, &settings.output_directory) {
            if !claimed.insert(output.clone()) {
                warn!("{:?} would overwrite the export of an earlier input", input);
                handles.push((input, Err(WatermarkError::OutputCollision(output))));
                continue;
            }
        }

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| WatermarkError::Task(e.to_string()))?;

        let settings = settings.clone();
        let compositor = compositor.clone();
        let config = config.clone();
        let task_input = input.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            export_one(&task_input, &settings, &compositor, &config)
        });
        handles.push((input, Ok(handle)));
    }

    let mut report = ExportReport::default();
    for (input, handle) in handles {
        let result = match handle {
            Ok(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => Err(WatermarkError::Task(e.to_string())),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(output) => report.written.push(output),
            Err(e) => {
                error!("Failed to export {:?}: {}", input, e);
                report.failed.push(ExportFailure {
                    path: input,
                    error: e,
                });
            }
        }
    }

    if report.is_success() {
        info!("Exported {} images", report.written.len());
    } else {
        warn!(
            "Exported {} of {} images, {} failed",
            report.written.len(),
            report.attempted(),
            report.failed.len()
        );
    }

    Ok(report)
}
