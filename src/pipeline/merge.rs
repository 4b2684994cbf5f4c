//! Merge: ordered single-page artifacts → one combined multi-page PDF.
//!
//! ## Why rebuild the page tree?
//!
//! Each artifact is a complete PDF with its own catalog and Pages node.
//! Concatenating documents therefore means renumbering every object into a
//! shared id space, carrying over the content objects, and assembling one
//! fresh Pages tree whose Kids follow the page index order. Inherited page
//! attributes (MediaBox, Resources) are copied down onto each page dict
//! first, because the source Pages nodes that held them are discarded.
//!
//! ## Ordering
//!
//! This is the single place where page order is decided. Inputs are sorted
//! by `index` here, so whatever order render tasks completed in upstream is
//! irrelevant by construction. The sorted sequence must then be exactly
//! `0..N` — a gap or duplicate means a coordinator bug, and the merger
//! refuses to paper over it.

use crate::error::Img2PdfError;
use crate::pipeline::render::RenderedPage;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Combine the rendered pages into one document on scratch storage.
///
/// On success the per-page artifacts are deleted (best-effort) and the
/// path of the combined document is returned.
pub fn merge_pages(
    mut pages: Vec<RenderedPage>,
    scratch_dir: &Path,
) -> Result<PathBuf, Img2PdfError> {
    if pages.is_empty() {
        return Err(Img2PdfError::Merge {
            detail: "no pages to merge".into(),
        });
    }

    pages.sort_by_key(|p| p.index);
    verify_contiguous(&pages)?;

    let mut max_id: u32 = 1;
    let mut page_objects: Vec<(ObjectId, Dictionary)> = Vec::with_capacity(pages.len());
    let mut carried_objects: Vec<(ObjectId, Object)> = Vec::new();

    for page in &pages {
        let mut doc = Document::load(&page.path).map_err(|e| Img2PdfError::Merge {
            detail: format!("page {}: {}", page.index + 1, e),
        })?;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let source_pages = doc.get_pages();
        if source_pages.len() != 1 {
            return Err(Img2PdfError::Merge {
                detail: format!(
                    "page {}: artifact has {} pages, expected 1",
                    page.index + 1,
                    source_pages.len()
                ),
            });
        }

        for &page_id in source_pages.values() {
            let dict = doc
                .get_dictionary(page_id)
                .map_err(|e| Img2PdfError::Merge {
                    detail: format!("page {}: {}", page.index + 1, e),
                })?
                .clone();
            let dict = inherit_page_attrs(&doc, dict);
            page_objects.push((page_id, dict));
        }

        // The structural nodes are rebuilt below; everything else (content
        // streams, image XObjects, fonts) carries over unchanged.
        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => carried_objects.push((object_id, object)),
            }
        }
    }

    let mut document = Document::with_version("1.5");
    for (object_id, object) in carried_objects {
        document.objects.insert(object_id, object);
    }

    let pages_id = document.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(page_objects.len());
    for (page_id, mut dict) in page_objects {
        dict.set("Parent", Object::Reference(pages_id));
        kids.push(Object::Reference(page_id));
        document.objects.insert(page_id, Object::Dictionary(dict));
    }

    let page_count = kids.len();
    let pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(page_count as i64)),
    ]);
    document
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = document.new_object_id();
    let catalog_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    document
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    document.trailer.set("Root", Object::Reference(catalog_id));
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();

    let combined = scratch_dir.join("combined.pdf");
    document.save(&combined).map_err(|e| Img2PdfError::Merge {
        detail: format!("failed to write combined document: {e}"),
    })?;

    info!("Merged {} pages into {}", page_count, combined.display());

    // The page artifacts are spent. Removal is best-effort: a leftover in
    // the scratch dir is reclaimed when the run's TempDir drops anyway.
    for page in &pages {
        if let Err(e) = std::fs::remove_file(&page.path) {
            warn!("Failed to remove page artifact {}: {}", page.path.display(), e);
        }
    }

    Ok(combined)
}

/// Reject index sequences with gaps or duplicates. `pages` must be sorted.
fn verify_contiguous(pages: &[RenderedPage]) -> Result<(), Img2PdfError> {
    for (slot, page) in pages.iter().enumerate() {
        if page.index != slot {
            return Err(Img2PdfError::IncompletePageSet {
                expected: pages.len(),
                slot,
                problem: if page.index > slot {
                    "missing"
                } else {
                    "duplicated"
                },
            });
        }
    }
    Ok(())
}

/// Copy MediaBox and Resources down from the source document's Pages node
/// when the page dict relies on inheritance.
fn inherit_page_attrs(doc: &Document, mut dict: Dictionary) -> Dictionary {
    for key in [b"MediaBox".as_slice(), b"Resources".as_slice()] {
        if dict.get(key).is_ok() {
            continue;
        }
        if let Some(value) = pages_node_attr(doc, key) {
            debug!("Inheriting {} from source Pages node", String::from_utf8_lossy(key));
            dict.set(key, value);
        }
    }
    dict
}

/// Look an attribute up on the source document's root Pages node.
fn pages_node_attr(doc: &Document, key: &[u8]) -> Option<Object> {
    let root = doc.trailer.get(b"Root").ok()?;
    let catalog_id = root.as_reference().ok()?;
    let catalog = doc.get_dictionary(catalog_id).ok()?;
    let pages_id = catalog.get(b"Pages").ok()?.as_reference().ok()?;
    let pages = doc.get_dictionary(pages_id).ok()?;
    pages.get(key).ok().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use printpdf::{Mm, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg};

    /// Write a blank single-page PDF with a distinctive height so page
    /// order is observable after merging.
    fn page_artifact(dir: &Path, index: usize, height_mm: f32) -> RenderedPage {
        let mut doc = PdfDocument::new(&format!("page {index}"));
        doc.with_pages(vec![PdfPage::new(Mm(100.0), Mm(height_mm), Vec::new())]);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);

        let path = dir.join(format!("page_{index}.pdf"));
        std::fs::write(&path, &bytes).unwrap();
        RenderedPage { index, path }
    }

    /// MediaBox heights of the document's pages, in page order.
    fn page_heights(path: &Path) -> Vec<f32> {
        let doc = Document::load(path).unwrap();
        let pages = doc.get_pages();
        let mut heights = Vec::with_capacity(pages.len());
        for (_num, page_id) in pages {
            let dict = doc.get_dictionary(page_id).unwrap();
            let media_box = match dict.get(b"MediaBox").unwrap() {
                Object::Array(arr) => arr.clone(),
                other => panic!("unexpected MediaBox object: {other:?}"),
            };
            let top = match &media_box[3] {
                Object::Integer(i) => *i as f32,
                Object::Real(r) => *r,
                other => panic!("unexpected MediaBox entry: {other:?}"),
            };
            heights.push(top);
        }
        heights
    }

    #[test]
    fn merge_preserves_index_order_regardless_of_input_order() {
        let scratch = tempfile::tempdir().unwrap();
        // Pages arrive in simulated completion order 2, 0, 1 with heights
        // that encode their index.
        let pages = vec![
            page_artifact(scratch.path(), 2, 300.0),
            page_artifact(scratch.path(), 0, 100.0),
            page_artifact(scratch.path(), 1, 200.0),
        ];

        let combined = merge_pages(pages, scratch.path()).unwrap();
        let heights = page_heights(&combined);

        assert_eq!(heights.len(), 3);
        // Mm → Pt conversion: 1mm = 2.8346457pt. Order is what matters.
        assert!(heights[0] < heights[1] && heights[1] < heights[2]);
    }

    #[test]
    fn merge_round_trip_page_count() {
        let scratch = tempfile::tempdir().unwrap();
        let pages = (0..5)
            .map(|i| page_artifact(scratch.path(), i, 150.0))
            .collect();
        let combined = merge_pages(pages, scratch.path()).unwrap();

        let doc = Document::load(&combined).unwrap();
        assert_eq!(doc.get_pages().len(), 5);
    }

    #[test]
    fn page_artifacts_removed_after_merge() {
        let scratch = tempfile::tempdir().unwrap();
        let pages: Vec<_> = (0..2)
            .map(|i| page_artifact(scratch.path(), i, 150.0))
            .collect();
        let artifact_paths: Vec<_> = pages.iter().map(|p| p.path.clone()).collect();

        merge_pages(pages, scratch.path()).unwrap();

        for path in artifact_paths {
            assert!(!path.exists(), "{} should be deleted", path.display());
        }
    }

    #[test]
    fn gap_in_index_sequence_rejected() {
        let scratch = tempfile::tempdir().unwrap();
        let pages = vec![
            page_artifact(scratch.path(), 0, 100.0),
            page_artifact(scratch.path(), 2, 300.0),
        ];
        let err = merge_pages(pages, scratch.path()).unwrap_err();
        assert!(matches!(
            err,
            Img2PdfError::IncompletePageSet {
                slot: 1,
                problem: "missing",
                ..
            }
        ));
    }

    #[test]
    fn duplicate_index_rejected() {
        let scratch = tempfile::tempdir().unwrap();
        let pages = vec![
            page_artifact(scratch.path(), 0, 100.0),
            page_artifact(scratch.path(), 1, 200.0),
            page_artifact(scratch.path(), 1, 250.0),
        ];
        let err = merge_pages(pages, scratch.path()).unwrap_err();
        assert!(matches!(
            err,
            Img2PdfError::IncompletePageSet {
                problem: "duplicated",
                ..
            }
        ));
    }

    #[test]
    fn unreadable_artifact_rejected() {
        let scratch = tempfile::tempdir().unwrap();
        let bogus = scratch.path().join("page_0.pdf");
        std::fs::write(&bogus, b"not a pdf at all").unwrap();
        let pages = vec![RenderedPage {
            index: 0,
            path: bogus,
        }];

        let err = merge_pages(pages, scratch.path()).unwrap_err();
        assert!(matches!(err, Img2PdfError::Merge { .. }));
    }

    #[test]
    fn empty_page_set_rejected() {
        let scratch = tempfile::tempdir().unwrap();
        let err = merge_pages(Vec::new(), scratch.path()).unwrap_err();
        assert!(matches!(err, Img2PdfError::Merge { .. }));
    }
}
