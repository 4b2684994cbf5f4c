//! Eager (full-run) conversion entry points.
//!
//! [`convert_folder`] drives the whole pipeline for one folder and returns
//! when the PDF is on disk (or the run failed). Callers that need a live
//! progress feed or a one-run-at-a-time guard use
//! [`crate::runner::Converter`], which runs this same pipeline on a
//! background task.
//!
//! ## Failure semantics
//!
//! The first error from any stage aborts the run. Rendering fans out across
//! worker threads, but the fan-in loop stops consuming on the first
//! failure, so queued render tasks never start and in-flight ones finish
//! into the void. Scratch artifacts live in a per-run temp directory whose
//! `Drop` removes them on every exit path, success or failure — the final
//! destination is only ever touched by the compressor's atomic rename.

use crate::config::ConversionConfig;
use crate::error::Img2PdfError;
use crate::output::{ConversionOutput, ConversionStats, RunOutcome};
use crate::pipeline::{compress, input, merge, render};
use crate::progress::{self, ProgressSender};
use crate::runner::{PipelineState, StateCell};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a folder of images into one compressed, page-ordered PDF.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_dir` — folder whose images become the document's pages, in
///   file-name order
/// * `config` — conversion configuration
///
/// # Returns
/// `Ok(RunOutcome::Converted)` with the output path and stats, or
/// `Ok(RunOutcome::NoImages)` when nothing in the folder matched a
/// supported extension (nothing is written in that case).
///
/// # Errors
/// Any stage failure aborts the run: an unreadable file, a corrupt image,
/// a bad artifact, or an unwritable destination. No partial document is
/// ever left at the final destination.
pub async fn convert_folder(
    input_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RunOutcome, Img2PdfError> {
    let (progress, _monitor) = progress::channel();
    run_pipeline(
        input_dir.as_ref().to_path_buf(),
        config.clone(),
        progress,
        StateCell::default(),
    )
    .await
}

/// Synchronous wrapper around [`convert_folder`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_folder_sync(
    input_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RunOutcome, Img2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Img2PdfError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert_folder(input_dir, config))
}

/// Where the output lands when the config does not override it:
/// `<parent-of-input>/<input-basename>.pdf`.
pub fn default_output_path(input_dir: &Path) -> PathBuf {
    let basename = input_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    // A bare folder name has an empty parent; treat that as the CWD.
    input_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{basename}.pdf"))
}

/// Run the full pipeline, publishing progress. Shared by the eager entry
/// points above and by [`crate::runner::Converter`].
pub(crate) async fn run_pipeline(
    input_dir: PathBuf,
    config: ConversionConfig,
    progress: ProgressSender,
    state: StateCell,
) -> Result<RunOutcome, Img2PdfError> {
    progress.reset("starting");
    state.set(PipelineState::Loading);
    match drive(&input_dir, &config, &progress, &state).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            // Mirror the converter this replaces: a failed run leaves no
            // stale progress behind.
            progress.reset(format!("{} failed", e.stage()));
            Err(e)
        }
    }
}

async fn drive(
    input_dir: &Path,
    config: &ConversionConfig,
    progress: &ProgressSender,
    state: &StateCell,
) -> Result<RunOutcome, Img2PdfError> {
    let total_start = Instant::now();
    info!("Starting conversion of {}", input_dir.display());

    // ── Step 1: Load images ──────────────────────────────────────────────
    let load_start = Instant::now();
    let assets = {
        let dir = input_dir.to_path_buf();
        let progress = progress.clone();
        tokio::task::spawn_blocking(move || input::load_assets(&dir, &progress))
            .await
            .map_err(|e| Img2PdfError::Internal(format!("Load task panicked: {e}")))??
    };
    let load_duration_ms = load_start.elapsed().as_millis() as u64;

    let total = assets.len();
    if total == 0 {
        info!("No supported images in {}", input_dir.display());
        progress.set_status("no images found");
        return Ok(RunOutcome::NoImages);
    }
    debug!("Loaded {} images in {}ms", total, load_duration_ms);

    let output_path = config
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input_dir));

    // Per-run scratch directory; Drop removes whatever the stages left
    // behind, on success and on every failure path alike.
    let scratch = match &config.scratch_root {
        Some(root) => tempfile::Builder::new().prefix("img2pdf-").tempdir_in(root),
        None => tempfile::Builder::new().prefix("img2pdf-").tempdir(),
    }
    .map_err(|e| Img2PdfError::Internal(format!("Failed to create scratch directory: {e}")))?;

    // ── Step 2: Render pages in parallel ─────────────────────────────────
    state.set(PipelineState::Rendering);
    let render_start = Instant::now();
    let completed = Arc::new(AtomicUsize::new(0));

    // Fan-out: one blocking task per image, at most `workers` in flight.
    // Fan-in: completions arrive in any order and land in their own index
    // slot, so completion order cannot affect page order.
    let mut results = stream::iter(assets.into_iter().map(|asset| {
        let scratch_dir = scratch.path().to_path_buf();
        let profile = config.profile;
        let progress = progress.clone();
        let completed = Arc::clone(&completed);
        async move {
            let rendered =
                tokio::task::spawn_blocking(move || render::render_page(asset, profile, &scratch_dir))
                    .await
                    .map_err(|e| Img2PdfError::Internal(format!("Render task panicked: {e}")))??;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            progress.set_render(
                done as f32 / total as f32 * 100.0,
                format!("rendering {done}/{total}"),
            );
            Ok::<render::RenderedPage, Img2PdfError>(rendered)
        }
    }))
    .buffer_unordered(config.workers);

    let mut slots: Vec<Option<render::RenderedPage>> = (0..total).map(|_| None).collect();
    while let Some(result) = results.next().await {
        // First failure wins: dropping the stream cancels queued tasks and
        // discards whatever the in-flight ones still produce.
        let page = result?;
        let idx = page.index;
        slots[idx] = Some(page);
    }
    drop(results);
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} pages in {}ms", total, render_duration_ms);

    let pages: Vec<render::RenderedPage> = slots.into_iter().flatten().collect();

    // ── Step 3: Merge in index order ─────────────────────────────────────
    state.set(PipelineState::Merging);
    progress.set_status(format!("merging {total} pages"));
    let merge_start = Instant::now();
    let combined = {
        let scratch_dir = scratch.path().to_path_buf();
        tokio::task::spawn_blocking(move || merge::merge_pages(pages, &scratch_dir))
            .await
            .map_err(|e| Img2PdfError::Internal(format!("Merge task panicked: {e}")))??
    };
    let merge_duration_ms = merge_start.elapsed().as_millis() as u64;

    // ── Step 4: Compress and land the output ─────────────────────────────
    state.set(PipelineState::Compressing);
    progress.set_status("compressing");
    let compress_start = Instant::now();
    let output_bytes = {
        let combined = combined.clone();
        let dest = output_path.clone();
        tokio::task::spawn_blocking(move || compress::compress_to(&combined, &dest))
            .await
            .map_err(|e| Img2PdfError::Internal(format!("Compress task panicked: {e}")))??
    };
    let compress_duration_ms = compress_start.elapsed().as_millis() as u64;
    progress.set_compress(100.0, format!("done — {total} pages"));

    drop(scratch);

    let stats = ConversionStats {
        load_duration_ms,
        render_duration_ms,
        merge_duration_ms,
        compress_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        output_bytes,
    };

    info!(
        "Conversion complete: {} pages → {} in {}ms",
        total,
        output_path.display(),
        stats.total_duration_ms
    );

    Ok(RunOutcome::Converted(ConversionOutput {
        image_count: total,
        output_path,
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_is_sibling_of_input() {
        let out = default_output_path(Path::new("/data/scans/photos"));
        assert_eq!(out, PathBuf::from("/data/scans/photos.pdf"));
    }

    #[test]
    fn default_output_for_bare_name() {
        let out = default_output_path(Path::new("photos"));
        assert_eq!(out, PathBuf::from("./photos.pdf"));
    }
}
