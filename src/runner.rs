//! Background-task coordinator: one run at a time, observable from outside.
//!
//! [`Converter`] owns an explicit [`PipelineState`] machine instead of the
//! shared "processing" boolean the original folder converter guarded itself
//! with. A start request checks and flips the state under one lock, so two
//! callers racing to start can never both win, and a UI can render the
//! current stage by polling [`Converter::state`].
//!
//! The pipeline itself runs on a spawned tokio task — [`Converter::start`]
//! returns immediately with a [`RunHandle`], keeping the caller's thread
//! (typically a UI event loop) responsive. Progress arrives through the
//! watch channel exposed by [`Converter::monitor`]; the run result comes
//! from [`RunHandle::join`].
//!
//! Cancellation mid-run is not offered: a run proceeds to completion or to
//! its first error. Dropping the [`RunHandle`] detaches the run, it does
//! not stop it.

use crate::config::ConversionConfig;
use crate::convert;
use crate::error::Img2PdfError;
use crate::output::RunOutcome;
use crate::progress::{self, ProgressMonitor, ProgressSender};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::warn;

/// Where the pipeline currently is.
///
/// `Done` and `Failed` are terminal for a run but not for the converter: a
/// new start request is accepted from either, as well as from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    /// No run has been started yet, or the last run found no images.
    #[default]
    Idle,
    /// Enumerating and reading input files.
    Loading,
    /// Rendering pages on the worker pool.
    Rendering,
    /// Concatenating rendered pages.
    Merging,
    /// Compressing and writing the final document.
    Compressing,
    /// The last run produced a PDF.
    Done,
    /// The last run aborted with an error.
    Failed,
}

impl PipelineState {
    /// Whether a run is currently in flight.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            PipelineState::Loading
                | PipelineState::Rendering
                | PipelineState::Merging
                | PipelineState::Compressing
        )
    }
}

/// Shared, lock-guarded state cell. The pipeline writes stage transitions;
/// the converter reads them and gates new runs.
#[derive(Debug, Clone, Default)]
pub(crate) struct StateCell(Arc<Mutex<PipelineState>>);

impl StateCell {
    pub(crate) fn get(&self) -> PipelineState {
        *self.0.lock().expect("state lock poisoned")
    }

    pub(crate) fn set(&self, state: PipelineState) {
        *self.0.lock().expect("state lock poisoned") = state;
    }

    /// Flip to `Loading` iff no run is active. Check and transition happen
    /// under the same lock acquisition — the whole point of replacing the
    /// old boolean flag.
    pub(crate) fn try_begin(&self) -> Result<(), Img2PdfError> {
        let mut state = self.0.lock().expect("state lock poisoned");
        if state.is_active() {
            return Err(Img2PdfError::AlreadyRunning);
        }
        *state = PipelineState::Loading;
        Ok(())
    }
}

/// Handle to a run started with [`Converter::start`].
pub struct RunHandle {
    handle: JoinHandle<Result<RunOutcome, Img2PdfError>>,
}

impl RunHandle {
    /// Wait for the run to finish and return its outcome.
    pub async fn join(self) -> Result<RunOutcome, Img2PdfError> {
        self.handle
            .await
            .map_err(|e| Img2PdfError::Internal(format!("Conversion task panicked: {e}")))?
    }
}

/// Drives conversions one at a time, publishing state and progress.
///
/// # Example
/// ```rust,no_run
/// use img2pdf::{Converter, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = Converter::new(ConversionConfig::default());
/// let mut monitor = converter.monitor();
///
/// let run = converter.start("scans/photos")?;
/// tokio::spawn(async move {
///     while let Some(snapshot) = monitor.changed().await {
///         eprintln!("{:>5.1}% rendered — {}", snapshot.render, snapshot.status);
///     }
/// });
/// let outcome = run.join().await?;
/// # let _ = outcome;
/// # Ok(())
/// # }
/// ```
pub struct Converter {
    config: ConversionConfig,
    state: StateCell,
    progress: ProgressSender,
    monitor: ProgressMonitor,
}

impl Converter {
    /// Create a converter in the `Idle` state.
    pub fn new(config: ConversionConfig) -> Self {
        let (progress, monitor) = progress::channel();
        Self {
            config,
            state: StateCell::default(),
            progress,
            monitor,
        }
    }

    /// The pipeline's current state.
    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    /// A receiver for progress snapshots, valid across runs.
    pub fn monitor(&self) -> ProgressMonitor {
        self.monitor.clone()
    }

    /// Start converting `input_dir` on a background task.
    ///
    /// # Errors
    ///
    /// [`Img2PdfError::AlreadyRunning`] when a run is in flight; the
    /// request is rejected, never queued, and the active run is untouched.
    pub fn start(&self, input_dir: impl AsRef<Path>) -> Result<RunHandle, Img2PdfError> {
        self.state.try_begin()?;

        let dir = input_dir.as_ref().to_path_buf();
        let config = self.config.clone();
        let progress = self.progress.clone();
        let state = self.state.clone();

        let handle = tokio::spawn(async move {
            let result =
                convert::run_pipeline(dir, config, progress, state.clone()).await;
            match &result {
                Ok(RunOutcome::Converted(_)) => state.set(PipelineState::Done),
                // An empty folder is a non-event; the converter goes back
                // to rest rather than claiming success or failure.
                Ok(RunOutcome::NoImages) => state.set(PipelineState::Idle),
                Err(e) => {
                    warn!("Conversion failed during {}: {}", e.stage(), e);
                    state.set(PipelineState::Failed);
                }
            }
            result
        });

        Ok(RunHandle { handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(dir.join(name), bytes).unwrap();
    }

    fn test_config(out_dir: &Path) -> ConversionConfig {
        ConversionConfig::builder()
            .workers(2)
            .output(out_dir.join("out.pdf"))
            .build()
            .unwrap()
    }

    #[test]
    fn state_cell_rejects_concurrent_begin() {
        let cell = StateCell::default();
        cell.try_begin().unwrap();
        assert!(matches!(
            cell.try_begin(),
            Err(Img2PdfError::AlreadyRunning)
        ));

        cell.set(PipelineState::Done);
        cell.try_begin().unwrap();
    }

    #[test]
    fn terminal_states_are_not_active() {
        assert!(!PipelineState::Idle.is_active());
        assert!(!PipelineState::Done.is_active());
        assert!(!PipelineState::Failed.is_active());
        assert!(PipelineState::Rendering.is_active());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn second_start_rejected_while_running() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_png(input.path(), "a.png", 16, 16);

        let converter = Converter::new(test_config(out.path()));
        let run = converter.start(input.path()).unwrap();

        // `start` flips the state before spawning, so this is deterministic
        // even though the first run may already be executing.
        assert!(matches!(
            converter.start(input.path()),
            Err(Img2PdfError::AlreadyRunning)
        ));

        let outcome = run.join().await.unwrap();
        assert_eq!(outcome.converted().unwrap().image_count, 1);
        assert_eq!(converter.state(), PipelineState::Done);

        // A finished converter accepts a new run.
        let rerun = converter.start(input.path()).unwrap();
        rerun.join().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_run_lands_in_failed_state() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("broken.png"), b"not a png").unwrap();

        let converter = Converter::new(test_config(out.path()));
        let run = converter.start(input.path()).unwrap();

        assert!(run.join().await.is_err());
        assert_eq!(converter.state(), PipelineState::Failed);
        assert!(!out.path().join("out.pdf").exists());

        // Progress was reset on failure.
        let snap = converter.monitor().snapshot();
        assert_eq!(snap.render, 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn empty_folder_returns_to_idle() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let converter = Converter::new(test_config(out.path()));
        let outcome = converter.start(input.path()).unwrap().join().await.unwrap();

        assert!(matches!(outcome, RunOutcome::NoImages));
        assert_eq!(converter.state(), PipelineState::Idle);
        assert!(!out.path().join("out.pdf").exists());
    }
}
