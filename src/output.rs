//! Result types returned by a conversion run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The user-facing outcome of a run that did not fail.
///
/// An empty folder is a normal outcome, not an error — the distinction
/// matters to callers driving a UI: [`RunOutcome::NoImages`] warrants an
/// informational notice, while an `Err` warrants a failure dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The folder contained images and a PDF was written.
    Converted(ConversionOutput),
    /// No file in the folder matched a supported image extension.
    /// Nothing was written.
    NoImages,
}

impl RunOutcome {
    /// The conversion output, if any images were converted.
    pub fn converted(&self) -> Option<&ConversionOutput> {
        match self {
            RunOutcome::Converted(out) => Some(out),
            RunOutcome::NoImages => None,
        }
    }
}

/// Details of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Number of images converted — equal to the final page count.
    pub image_count: usize,
    /// Where the compressed PDF was written.
    pub output_path: PathBuf,
    /// Timing and size statistics.
    pub stats: ConversionStats,
}

/// Timing and size statistics for one run.
///
/// Durations are wall-clock per stage; `total_duration_ms` covers the whole
/// run including enumeration, so it can exceed the sum of the stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub load_duration_ms: u64,
    pub render_duration_ms: u64,
    pub merge_duration_ms: u64,
    pub compress_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Size of the final compressed PDF in bytes.
    pub output_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converted_accessor() {
        let outcome = RunOutcome::Converted(ConversionOutput {
            image_count: 3,
            output_path: PathBuf::from("/photos.pdf"),
            stats: ConversionStats::default(),
        });
        assert_eq!(outcome.converted().unwrap().image_count, 3);
        assert!(RunOutcome::NoImages.converted().is_none());
    }
}
