//! Pipeline stages for folder-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the PDF backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ layout ──▶ render ──▶ merge ──▶ compress
//! (folder)  (geometry)  (pages)   (combine)  (shrink + write)
//! ```
//!
//! 1. [`input`]  — enumerate and read the folder's images, sorted by name
//! 2. [`layout`] — pure placement math: pixels + profile → millimetres
//! 3. [`render`] — one image → one single-page PDF artifact; runs in
//!    `spawn_blocking` because decode + draw are CPU-bound
//! 4. [`merge`]  — concatenate artifacts in index order; the only place
//!    page order is decided
//! 5. [`compress`] — prune, deflate, and atomically land the final file

pub mod compress;
pub mod input;
pub mod layout;
pub mod merge;
pub mod render;
