use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Raster extensions accepted as batch input (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff"];

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[derive(Debug, Default)]
pub struct DiscoveredInputs {
    /// Image files, sorted and deduplicated
    pub images: Vec<PathBuf>,
    /// Paths that were given but could not be used
    pub skipped: Vec<PathBuf>,
}

/// Expand files and directories into the list of images to process.
///
/// Directories contribute their image files (hidden entries skipped); with
/// `recursive` set, subdirectories are walked too.
pub fn collect_images(paths: &[PathBuf], recursive: bool) -> DiscoveredInputs {
    let mut images = BTreeSet::new();
    let mut skipped = Vec::new();

    for path in paths {
        if path.is_dir() {
            collect_from_directory(path, recursive, &mut images);
        } else if path.is_file() && is_image_path(path) {
            images.insert(path.clone());
        } else {
            warn!("Skipping {:?}: not an image file or directory", path);
            skipped.push(path.clone());
        }
    }

    DiscoveredInputs {
        images: images.into_iter().collect(),
        skipped,
    }
}

fn collect_from_directory(dir: &Path, recursive: bool, images: &mut BTreeSet<PathBuf>) {
    let max_depth = if recursive { usize::MAX } else { 1 };
    debug!("Scanning directory: {:?}", dir);

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry.file_name().to_str()));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_image_path(entry.path()) => {
                images.insert(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read entry under {:?}: {}", dir, e),
        }
    }
}

fn is_hidden(file_name: Option<&str>) -> bool {
    file_name.map(|name| name.starts_with('.')).unwrap_or(false)
}
