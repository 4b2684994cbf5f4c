//! Input enumeration: find and read the images of a folder.
//!
//! ## Why read everything up front?
//!
//! Each render worker needs the full encoded bytes of its image anyway, and
//! reading sequentially on the coordinator keeps the load stage's progress
//! fraction honest (one file = one tick) while leaving the parallel stage
//! purely CPU-bound. The assets are moved — not copied — into their render
//! tasks afterwards.
//!
//! Ordering: files are sorted by file name, and that sort position becomes
//! the asset's `index`. Everything downstream (page order, progress
//! reporting, error messages) refers to this index.

use crate::error::Img2PdfError;
use crate::progress::ProgressSender;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extensions recognised as input images, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["tiff", "tif", "jpg", "jpeg", "png"];

/// One input image, read into memory and pinned to its page position.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    /// Zero-based position in the filename-sorted folder listing; the
    /// page this image becomes (page `index + 1`).
    pub index: usize,
    /// File name, kept for error messages.
    pub name: String,
    /// Raw encoded file contents.
    pub bytes: Vec<u8>,
}

/// Whether the file name carries a supported image extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|s| *s == lower)
        })
        .unwrap_or(false)
}

/// List the supported image files of `dir`, sorted by file name.
///
/// Non-matching entries and subdirectories are ignored silently — folders
/// of scans routinely contain thumbnails, notes, and output from earlier
/// runs.
pub fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>, Img2PdfError> {
    if !dir.is_dir() {
        return Err(Img2PdfError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|_| Img2PdfError::InputDirNotFound {
        path: dir.to_path_buf(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_supported(p))
        .collect();

    files.sort_by_key(|p| p.file_name().map(|n| n.to_owned()));

    debug!("Found {} image files in {}", files.len(), dir.display());
    Ok(files)
}

/// Read every supported image of `dir` into [`ImageAsset`]s, reporting
/// per-file load progress.
///
/// Returns an empty vector when no file matches — the caller decides that
/// this is the no-images outcome rather than an error.
pub fn load_assets(
    dir: &Path,
    progress: &ProgressSender,
) -> Result<Vec<ImageAsset>, Img2PdfError> {
    let files = list_image_files(dir)?;
    let total = files.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut assets = Vec::with_capacity(total);
    for (index, path) in files.into_iter().enumerate() {
        let bytes = std::fs::read(&path).map_err(|source| Img2PdfError::ImageReadFailed {
            path: path.clone(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        assets.push(ImageAsset { index, name, bytes });

        let pct = (index + 1) as f32 / total as f32 * 100.0;
        progress.set_load(pct, format!("loading {}/{}", index + 1, total));
    }

    info!("Loaded {} images from {}", total, dir.display());
    Ok(assets)
}
