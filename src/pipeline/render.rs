//! Page rendering: one image → one single-page PDF artifact on scratch
//! storage.
//!
//! ## Why a blocking function?
//!
//! Decoding a scan and re-encoding it into a PDF page is pure CPU work that
//! can take hundreds of milliseconds per image. The coordinator therefore
//! runs each call inside `tokio::task::spawn_blocking`, keeping the async
//! worker threads free; the function itself stays synchronous so it is
//! trivially testable and carries no executor assumptions.
//!
//! ## Isolation
//!
//! A render call touches nothing shared: it owns its [`ImageAsset`], writes
//! one file named after its index, and returns. Two renders can never
//! contend, which is what lets the coordinator fan them out without locks.

use crate::config::CanvasProfile;
use crate::error::Img2PdfError;
use crate::pipeline::input::ImageAsset;
use crate::pipeline::layout;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A rendered single-page document, tied to the image's folder position.
///
/// The backing file lives in the run's scratch directory until the merger
/// consumes it (or the scratch directory is dropped on failure).
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Same index as the originating [`ImageAsset`].
    pub index: usize,
    /// Location of the one-page PDF on scratch storage.
    pub path: PathBuf,
}

/// Render one image onto a page of the given profile, writing
/// `page_<index>.pdf` into `scratch_dir`.
///
/// # Errors
///
/// * [`Img2PdfError::Decode`] — the bytes are not a decodable image, no
///   matter what the file extension promised.
/// * [`Img2PdfError::InvalidImage`] — the image decoded to a zero
///   dimension.
/// * [`Img2PdfError::Render`] — the page artifact could not be written.
pub fn render_page(
    asset: ImageAsset,
    profile: CanvasProfile,
    scratch_dir: &Path,
) -> Result<RenderedPage, Img2PdfError> {
    let dynamic = image::load_from_memory(&asset.bytes).map_err(|e| Img2PdfError::Decode {
        name: asset.name.clone(),
        detail: e.to_string(),
    })?;

    let (width_px, height_px) = (dynamic.width(), dynamic.height());
    let placement = layout::compute_placement(&asset.name, width_px, height_px, profile)?;

    // printpdf wants raw RGB8; alpha is dropped, which is fine for scans —
    // PDF image XObjects have no alpha channel anyway.
    let rgb = dynamic.to_rgb8();
    let raw = RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width: width_px as usize,
        height: height_px as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };

    let mut doc = PdfDocument::new(&asset.name);
    let xobject_id = doc.add_image(&raw);

    let (page_w_mm, page_h_mm) = profile.dimensions_mm();

    // At 72 DPI one pixel is one point, so scaling the XObject to the
    // placement is a direct pt-per-px ratio.
    let dpi = 72.0;
    let target_w_pt = Mm(placement.target_width_mm as f32).into_pt().0;
    let target_h_pt = Mm(placement.target_height_mm as f32).into_pt().0;
    let ops = vec![Op::UseXobject {
        id: xobject_id,
        transform: XObjectTransform {
            translate_x: Some(Pt(Mm(placement.offset_x_mm as f32).into_pt().0)),
            translate_y: Some(Pt(Mm(placement.offset_y_mm as f32).into_pt().0)),
            scale_x: Some(target_w_pt / width_px as f32),
            scale_y: Some(target_h_pt / height_px as f32),
            dpi: Some(dpi),
            rotate: None,
        },
    }];

    let page = PdfPage::new(Mm(page_w_mm as f32), Mm(page_h_mm as f32), ops);
    doc.with_pages(vec![page]);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);

    let path = scratch_dir.join(format!("page_{}.pdf", asset.index));
    std::fs::write(&path, &bytes).map_err(|e| Img2PdfError::Render {
        page: asset.index,
        detail: format!("failed to write page artifact: {e}"),
    })?;

    debug!(
        "Rendered '{}' ({}x{}px) → page {} at {:.1}x{:.1}mm",
        asset.name,
        width_px,
        height_px,
        asset.index + 1,
        placement.target_width_mm,
        placement.target_height_mm,
    );

    Ok(RenderedPage {
        index: asset.index,
        path,
    })
}
