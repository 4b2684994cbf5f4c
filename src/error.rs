//! Error types for the img2pdf library.
//!
//! Every pipeline failure is fatal: a single bad image or a single write
//! failure aborts the whole run and nothing is written to the final
//! destination. There is deliberately no retry machinery anywhere — the
//! inputs are local files, so a failure is either permanent (corrupt image,
//! unwritable directory) or a bug, and neither improves on a second attempt.
//!
//! An empty input folder is **not** an error. It surfaces as
//! [`crate::output::RunOutcome::NoImages`] so callers can show an
//! informational notice instead of a failure dialog.
//!
//! Each error knows which pipeline [`Stage`] produced it via
//! [`Img2PdfError::stage`], letting a UI or CLI prefix the message with the
//! failure origin without parsing the text.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The pipeline stage an error originated from.
///
/// Used for display only — the variant of [`Img2PdfError`] carries the
/// actual detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    /// Enumerating and reading input files.
    Load,
    /// Decoding images and producing single-page documents.
    Render,
    /// Concatenating single-page documents.
    Merge,
    /// Compressing and writing the final document.
    Compress,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Load => "load",
            Stage::Render => "render",
            Stage::Merge => "merge",
            Stage::Compress => "compress",
        };
        f.write_str(s)
    }
}

/// All fatal errors returned by the img2pdf library.
#[derive(Debug, Error)]
pub enum Img2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input path does not exist or is not a directory.
    #[error("Input folder not found: '{path}'\nCheck the path exists and is a directory.")]
    InputDirNotFound { path: PathBuf },

    /// An input file matched a supported extension but could not be read.
    #[error("Failed to read image file '{path}': {source}")]
    ImageReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The image decoded to a degenerate (zero-dimension) size.
    #[error("Image '{name}' has invalid dimensions {width}x{height}px")]
    InvalidImage {
        name: String,
        width: u32,
        height: u32,
    },

    /// The file's bytes are not a decodable image, despite its extension.
    #[error("Failed to decode image '{name}': {detail}\nThe file may be corrupt or mislabelled.")]
    Decode { name: String, detail: String },

    /// Building or writing a single-page document failed.
    #[error("Failed to render page {page}: {detail}")]
    Render { page: usize, detail: String },

    // ── Merge errors ──────────────────────────────────────────────────────
    /// A rendered page artifact is unreadable or malformed, or the combined
    /// document could not be written.
    #[error("Failed to merge pages: {detail}")]
    Merge { detail: String },

    /// The rendered page set has a gap or a duplicate index.
    ///
    /// The coordinator guarantees completeness, so this firing means a bug
    /// upstream — but the merger checks anyway rather than silently
    /// producing a misordered document.
    #[error("Incomplete page set: expected {expected} pages, slot {slot} is {problem}")]
    IncompletePageSet {
        expected: usize,
        slot: usize,
        problem: &'static str,
    },

    // ── Compression errors ────────────────────────────────────────────────
    /// The combined document is missing or unparseable.
    #[error("Failed to compress document '{path}': {detail}")]
    Compression { path: PathBuf, detail: String },

    /// Could not write the final PDF at the destination.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Coordinator errors ────────────────────────────────────────────────
    /// A run was started while another is still active.
    ///
    /// Runs are never queued — the caller decides whether to wait and
    /// retry. The in-progress run is unaffected.
    #[error("A conversion is already running")]
    AlreadyRunning,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Img2PdfError {
    /// The pipeline stage this error originated from.
    pub fn stage(&self) -> Stage {
        match self {
            Img2PdfError::InputDirNotFound { .. } | Img2PdfError::ImageReadFailed { .. } => {
                Stage::Load
            }
            Img2PdfError::InvalidImage { .. }
            | Img2PdfError::Decode { .. }
            | Img2PdfError::Render { .. } => Stage::Render,
            Img2PdfError::Merge { .. } | Img2PdfError::IncompletePageSet { .. } => Stage::Merge,
            Img2PdfError::Compression { .. } | Img2PdfError::OutputWriteFailed { .. } => {
                Stage::Compress
            }
            // Raised before or outside a stage; attributed to Load so a UI
            // always has an origin to show.
            Img2PdfError::AlreadyRunning
            | Img2PdfError::InvalidConfig(_)
            | Img2PdfError::Internal(_) => Stage::Load,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_image_display() {
        let e = Img2PdfError::InvalidImage {
            name: "scan_03.png".into(),
            width: 0,
            height: 1200,
        };
        let msg = e.to_string();
        assert!(msg.contains("scan_03.png"), "got: {msg}");
        assert!(msg.contains("0x1200"), "got: {msg}");
    }

    #[test]
    fn incomplete_page_set_display() {
        let e = Img2PdfError::IncompletePageSet {
            expected: 5,
            slot: 3,
            problem: "missing",
        };
        let msg = e.to_string();
        assert!(msg.contains("5 pages"));
        assert!(msg.contains("slot 3"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn stage_attribution() {
        let decode = Img2PdfError::Decode {
            name: "a.jpg".into(),
            detail: "truncated".into(),
        };
        assert_eq!(decode.stage(), Stage::Render);

        let merge = Img2PdfError::Merge {
            detail: "page 2: bad xref".into(),
        };
        assert_eq!(merge.stage(), Stage::Merge);

        let out = Img2PdfError::OutputWriteFailed {
            path: PathBuf::from("/readonly/out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(out.stage(), Stage::Compress);
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(Stage::Load.to_string(), "load");
        assert_eq!(Stage::Compress.to_string(), "compress");
    }
}
