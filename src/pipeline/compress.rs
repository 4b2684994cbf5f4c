//! Compression: rewrite the combined document smaller and land it at the
//! final destination.
//!
//! printpdf emits uncompressed content streams, so this post-pass is where
//! the output actually shrinks: unreferenced objects are pruned and every
//! stream is deflate-compressed. Both rewrites are lossless with respect to
//! page content and order.
//!
//! ## Why write-then-rename?
//!
//! The destination may already hold the output of a previous run. Saving to
//! a sibling `.pdf.tmp` and renaming over the target means a failure at any
//! point leaves either the old file or no file — never a truncated PDF.

use crate::error::Img2PdfError;
use std::path::Path;
use tracing::{info, warn};

/// Compress the combined document at `source` and write the result to
/// `dest`, replacing any existing file there.
///
/// On success the combined scratch document is deleted (best-effort) and
/// the size of the final file in bytes is returned.
pub fn compress_to(source: &Path, dest: &Path) -> Result<u64, Img2PdfError> {
    let mut doc = lopdf::Document::load(source).map_err(|e| Img2PdfError::Compression {
        path: source.to_path_buf(),
        detail: e.to_string(),
    })?;

    doc.prune_objects();
    doc.compress();

    let tmp = dest.with_extension("pdf.tmp");
    if let Err(e) = doc.save(&tmp) {
        // A partial temp file may be left behind; remove it before bailing.
        let _ = std::fs::remove_file(&tmp);
        return Err(Img2PdfError::OutputWriteFailed {
            path: dest.to_path_buf(),
            source: std::io::Error::other(e.to_string()),
        });
    }

    std::fs::rename(&tmp, dest).map_err(|source| Img2PdfError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source,
    })?;

    if let Err(e) = std::fs::remove_file(source) {
        warn!(
            "Failed to remove combined document {}: {}",
            source.display(),
            e
        );
    }

    let bytes = std::fs::metadata(dest)
        .map(|m| m.len())
        .unwrap_or_default();
    info!("Compressed document written to {} ({} bytes)", dest.display(), bytes);
    Ok(bytes)
}
