//! Page-level operations used while merging.
//!
//! This module handles:
//! - Pushing inherited page attributes down onto each page
//! - Turning page ranges into concrete page objects
//! - Re-parenting selected pages under a new page tree

use lopdf::{Document, Object, ObjectId, dictionary};

use crate::config::{PageRange, resolve_ranges};
use crate::error::{Result, SheetbinderError};

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Copy inherited attributes onto every page of `doc`.
///
/// Once a page leaves its original page tree it can no longer inherit, so
/// this must run before pages are re-parented.
pub fn flatten_inherited_attributes(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in page_ids {
        let inherited = collect_inherited(doc, page_id);
        if inherited.is_empty() {
            continue;
        }

        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for (key, value) in inherited {
                page.set(key, value);
            }
        }
    }
}

fn collect_inherited(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut inherited = Vec::new();
    let mut cursor = page.get(b"Parent").and_then(|p| p.as_reference()).ok();
    let mut depth = 0;

    while let Some(node_id) = cursor {
        if missing.is_empty() || depth >= MAX_TREE_DEPTH {
            break;
        }
        depth += 1;

        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };

        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });

        cursor = node.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }

    inherited
}

/// Pick the pages of `doc` selected by `ranges`, in range order.
///
/// An empty range list takes every page. A page selected more than once is
/// cloned into a fresh object so each occurrence can be parented on its own.
/// New object ids are allocated above `doc.max_id`.
pub fn select_pages(doc: &mut Document, ranges: &[PageRange]) -> Result<Vec<ObjectId>> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    if ranges.is_empty() {
        return Ok(pages);
    }

    let mut selected = Vec::new();
    for index in resolve_ranges(ranges, pages.len()) {
        let page_id = pages[index];

        if selected.contains(&page_id) {
            let copy = doc
                .get_object(page_id)
                .map_err(|e| SheetbinderError::merge_failed(format!("Failed to get page: {e}")))?
                .clone();
            selected.push(doc.add_object(copy));
        } else {
            selected.push(page_id);
        }
    }

    Ok(selected)
}

/// Install a fresh page tree and catalog over `page_ids`.
///
/// Every listed page is re-parented under the new tree. The previous catalog
/// stays in the object table until the next prune.
pub fn install_page_tree(doc: &mut Document, page_ids: &[ObjectId]) -> Result<ObjectId> {
    let pages_id = doc.new_object_id();

    for &page_id in page_ids {
        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|_| SheetbinderError::merge_failed("Page object is not a dictionary"))?;
        page.set("Parent", pages_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(pages_id)
}
