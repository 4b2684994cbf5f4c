//! Configuration types for folder-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.

use crate::error::Img2PdfError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A named fixed page size that images are rendered onto.
///
/// The set is closed: every page of a run uses the same profile, and the
/// profile decides both the page dimensions and which layout rule applies
/// (see [`crate::pipeline::layout`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CanvasProfile {
    /// Korean CSAT answer-sheet format, 272 × 394 mm. (default)
    ///
    /// Uses the fixed-target-width rule: images are always 235 mm wide,
    /// whatever their aspect ratio.
    #[default]
    Csat,
    /// ISO A4, 210 × 297 mm.
    ///
    /// Images are fitted inside the page on their longer relative axis.
    A4,
}

impl CanvasProfile {
    /// Page width and height in millimetres.
    pub const fn dimensions_mm(self) -> (f64, f64) {
        match self {
            CanvasProfile::Csat => (272.0, 394.0),
            CanvasProfile::A4 => (210.0, 297.0),
        }
    }

    /// Human-readable profile name, matching the selector labels.
    pub const fn name(self) -> &'static str {
        match self {
            CanvasProfile::Csat => "CSAT (272 x 394 mm)",
            CanvasProfile::A4 => "A4 (210 x 297 mm)",
        }
    }
}

/// Configuration for one folder-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use img2pdf::{CanvasProfile, ConversionConfig};
///
/// let config = ConversionConfig::builder()
///     .profile(CanvasProfile::A4)
///     .workers(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Canvas profile all pages are rendered onto. Default: [`CanvasProfile::Csat`].
    pub profile: CanvasProfile,

    /// Number of parallel page-render workers. Default: the number of
    /// logical CPU cores.
    ///
    /// Rendering is CPU-bound (image decode + page drawing), so more
    /// workers than cores buys nothing and just inflates peak memory —
    /// each in-flight worker holds one decoded image.
    pub workers: usize,

    /// Final PDF path. Default (`None`): `<input-parent>/<input-basename>.pdf`,
    /// overwriting any existing file — the behaviour users of the folder
    /// workflow expect when re-running a conversion.
    pub output: Option<PathBuf>,

    /// Directory under which the per-run scratch directory is created.
    /// Default (`None`): the system temp directory.
    ///
    /// Injectable so tests can place intermediates somewhere observable
    /// and so constrained environments can point scratch at a larger
    /// volume. The run's scratch directory itself is always freshly
    /// created and removed when the run ends, on every exit path.
    pub scratch_root: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            profile: CanvasProfile::default(),
            workers: num_cpus::get().max(1),
            output: None,
            scratch_root: None,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn profile(mut self, profile: CanvasProfile) -> Self {
        self.config.profile = profile;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n.max(1);
        self
    }

    pub fn output(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.config.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn scratch_root(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.config.scratch_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Img2PdfError> {
        let c = &self.config;
        if c.workers == 0 {
            return Err(Img2PdfError::InvalidConfig("Workers must be ≥ 1".into()));
        }
        let (w, h) = c.profile.dimensions_mm();
        if w <= 0.0 || h <= 0.0 {
            return Err(Img2PdfError::InvalidConfig(format!(
                "Canvas dimensions must be positive, got {w}x{h}mm"
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_csat() {
        let config = ConversionConfig::default();
        assert_eq!(config.profile, CanvasProfile::Csat);
        assert!(config.workers >= 1);
        assert!(config.output.is_none());
    }

    #[test]
    fn profile_dimensions() {
        assert_eq!(CanvasProfile::Csat.dimensions_mm(), (272.0, 394.0));
        assert_eq!(CanvasProfile::A4.dimensions_mm(), (210.0, 297.0));
    }

    #[test]
    fn workers_clamped_to_one() {
        let config = ConversionConfig::builder().workers(0).build().unwrap();
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn builder_sets_fields() {
        let config = ConversionConfig::builder()
            .profile(CanvasProfile::A4)
            .workers(3)
            .output("/tmp/out.pdf")
            .scratch_root("/tmp/scratch")
            .build()
            .unwrap();
        assert_eq!(config.profile, CanvasProfile::A4);
        assert_eq!(config.workers, 3);
        assert_eq!(config.output.as_deref(), Some(std::path::Path::new("/tmp/out.pdf")));
    }
}
