//! Placement math: image pixel dimensions + canvas profile → a centered
//! rectangle in millimetres.
//!
//! This is the one part of the pipeline with no I/O and no dependencies, so
//! it is kept as a pure function the renderer calls. Two layout rules exist,
//! one per profile family:
//!
//! * **CSAT** — fixed target width of 235 mm (leaving a symmetric margin on
//!   the 272 mm page), height following from the aspect ratio. Height is
//!   deliberately *not* bounded against the page: extremely tall scans
//!   overflow the page vertically, exactly as the original converter
//!   behaved. Exam sheets are all near the same aspect ratio, so in
//!   practice the case never arises.
//! * **A4** — fit inside the page: relatively tall images are fitted to the
//!   full page height, others to the full page width.
//!
//! Both rules center the placement on the page.

use crate::config::CanvasProfile;
use crate::error::Img2PdfError;

/// Target width of the CSAT rule, in millimetres.
const CSAT_TARGET_WIDTH_MM: f64 = 235.0;

/// The rectangle an image is drawn at within a page.
///
/// All values in millimetres; offsets are measured from the bottom-left
/// page corner (PDF coordinate convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub target_width_mm: f64,
    pub target_height_mm: f64,
    pub offset_x_mm: f64,
    pub offset_y_mm: f64,
}

/// Compute where an image of `width_px` × `height_px` lands on a page of
/// the given profile.
///
/// # Errors
///
/// Returns [`Img2PdfError::InvalidImage`] when either dimension is zero —
/// the only way this function can fail.
pub fn compute_placement(
    name: &str,
    width_px: u32,
    height_px: u32,
    profile: CanvasProfile,
) -> Result<Placement, Img2PdfError> {
    if width_px == 0 || height_px == 0 {
        return Err(Img2PdfError::InvalidImage {
            name: name.to_string(),
            width: width_px,
            height: height_px,
        });
    }

    let aspect = f64::from(height_px) / f64::from(width_px);
    let (page_w, page_h) = profile.dimensions_mm();

    let (target_w, target_h) = match profile {
        CanvasProfile::Csat => {
            let w = CSAT_TARGET_WIDTH_MM;
            (w, w * aspect)
        }
        CanvasProfile::A4 => {
            let canvas_aspect = page_h / page_w;
            if aspect > canvas_aspect {
                // Relatively taller than the page: full height, derive width.
                (page_h / aspect, page_h)
            } else {
                (page_w, page_w * aspect)
            }
        }
    };

    Ok(Placement {
        target_width_mm: target_w,
        target_height_mm: target_h,
        offset_x_mm: (page_w - target_w) / 2.0,
        offset_y_mm: (page_h - target_h) / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn csat_uses_fixed_target_width() {
        // 400x300px — the aspect ratio 0.75 drives the height.
        let p = compute_placement("a.png", 400, 300, CanvasProfile::Csat).unwrap();
        assert!((p.target_width_mm - 235.0).abs() < EPS);
        assert!((p.target_height_mm - 235.0 * 0.75).abs() < EPS);
        assert!((p.offset_x_mm - (272.0 - 235.0) / 2.0).abs() < EPS);
        assert!((p.offset_y_mm - (394.0 - 235.0 * 0.75) / 2.0).abs() < EPS);
    }

    #[test]
    fn csat_tall_image_may_overflow_vertically() {
        // aspect 4.0 → 940mm target height on a 394mm page. Preserved
        // behaviour: the placement is produced, offset going negative.
        let p = compute_placement("tall.png", 500, 2000, CanvasProfile::Csat).unwrap();
        assert!((p.target_height_mm - 940.0).abs() < EPS);
        assert!(p.offset_y_mm < 0.0);
    }

    #[test]
    fn a4_tall_image_fits_height() {
        // aspect 2.0 > A4 aspect (~1.414): fit to full height.
        let p = compute_placement("b.jpg", 300, 600, CanvasProfile::A4).unwrap();
        assert!((p.target_height_mm - 297.0).abs() < EPS);
        assert!((p.target_width_mm - 297.0 / 2.0).abs() < EPS);
    }

    #[test]
    fn a4_wide_image_fits_width() {
        // aspect 0.5 < A4 aspect: fit to full width.
        let p = compute_placement("c.jpg", 600, 300, CanvasProfile::A4).unwrap();
        assert!((p.target_width_mm - 210.0).abs() < EPS);
        assert!((p.target_height_mm - 105.0).abs() < EPS);
    }

    #[test]
    fn a4_placement_always_fits_and_centers() {
        // Sweep a wide range of aspect ratios; the A4 rule must never
        // exceed the page on either axis and must stay centered.
        for (w, h) in [
            (1u32, 1u32),
            (10, 1),
            (1, 10),
            (4961, 7016), // A4 scan at 600dpi
            (300, 400),
            (400, 300),
            (123, 4567),
            (9999, 17),
        ] {
            let p = compute_placement("x", w, h, CanvasProfile::A4).unwrap();
            assert!(p.target_width_mm <= 210.0 + EPS, "{w}x{h}: too wide");
            assert!(p.target_height_mm <= 297.0 + EPS, "{w}x{h}: too tall");
            assert!(
                (p.offset_x_mm - (210.0 - p.target_width_mm) / 2.0).abs() < EPS,
                "{w}x{h}: not centered horizontally"
            );
            assert!(
                (p.offset_y_mm - (297.0 - p.target_height_mm) / 2.0).abs() < EPS,
                "{w}x{h}: not centered vertically"
            );
        }
    }

    #[test]
    fn aspect_ratio_preserved() {
        for profile in [CanvasProfile::Csat, CanvasProfile::A4] {
            let p = compute_placement("x", 640, 480, profile).unwrap();
            let placed_aspect = p.target_height_mm / p.target_width_mm;
            assert!((placed_aspect - 0.75).abs() < EPS, "{profile:?}");
        }
    }

    #[test]
    fn zero_dimension_rejected() {
        let err = compute_placement("empty.png", 0, 100, CanvasProfile::Csat).unwrap_err();
        assert!(matches!(err, Img2PdfError::InvalidImage { width: 0, .. }));

        let err = compute_placement("empty.png", 100, 0, CanvasProfile::A4).unwrap_err();
        assert!(matches!(err, Img2PdfError::InvalidImage { height: 0, .. }));
    }
}
