//! # img2pdf
//!
//! Convert a folder of images into one compressed, page-ordered PDF.
//!
//! ## Why this crate?
//!
//! Scanners and phone cameras leave you with a folder of numbered images;
//! what you actually want to archive, print, or send is a single PDF whose
//! pages follow the file names. This crate does exactly that conversion —
//! and nothing else: each image becomes one fixed-size page, laid out
//! centered and aspect-preserving, and the result is stream-compressed so a
//! folder of PNG scans doesn't turn into a bloated document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! folder
//!  │
//!  ├─ 1. Load      enumerate supported images, sorted by file name
//!  ├─ 2. Render    one single-page PDF per image (CPU-bound, worker pool)
//!  ├─ 3. Merge     concatenate pages in folder order
//!  └─ 4. Compress  prune + deflate, atomic write to <folder>.pdf
//! ```
//!
//! Rendering is parallel and completes out of order; page order is restored
//! by index before merging, so the output always follows the file-name
//! sort. Any stage failure aborts the whole run — no partial PDF is ever
//! written to the destination.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2pdf::{convert_folder, ConversionConfig, RunOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     match convert_folder("scans/photos", &config).await? {
//!         RunOutcome::Converted(out) => {
//!             println!("{} pages → {}", out.image_count, out.output_path.display());
//!         }
//!         RunOutcome::NoImages => println!("no images in folder"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For a UI (or anything else that needs live progress and a guarantee that
//! only one run is active), use [`Converter`]: it runs the pipeline on a
//! background task, publishes [`ProgressSnapshot`]s through a watch
//! channel, and rejects a second start while a run is in flight.
//!
//! ## Canvas profiles
//!
//! | Profile | Page size | Layout rule |
//! |---------|-----------|-------------|
//! | `CSAT` (default) | 272 × 394 mm | fixed 235 mm image width |
//! | `A4` | 210 × 297 mm | fit inside the page |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! img2pdf = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod runner;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CanvasProfile, ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert_folder, convert_folder_sync, default_output_path};
pub use error::{Img2PdfError, Stage};
pub use output::{ConversionOutput, ConversionStats, RunOutcome};
pub use progress::{ProgressMonitor, ProgressSnapshot};
pub use runner::{Converter, PipelineState, RunHandle};
