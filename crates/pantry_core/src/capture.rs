//! crates/pantry_core/src/capture.rs
//!
//! Turns the labels detected in a captured photo into a new inventory draft.

use crate::domain::{Category, ItemDraft};

pub const UNKNOWN_ITEM_NAME: &str = "Unknown Item";
pub const CAPTURE_DESCRIPTION: &str = "Detected via image capture";

/// The first label names the item; the second picks the category when it
/// matches one, otherwise the item is filed under `Other`. Price and supplier
/// are left unset. The category and description only apply when the item is
/// new.
pub fn draft_from_labels(labels: &[String]) -> ItemDraft {
    let name = labels
        .first()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .unwrap_or(UNKNOWN_ITEM_NAME)
        .to_string();
    let category = labels
        .get(1)
        .and_then(|l| l.parse::<Category>().ok())
        .unwrap_or(Category::Other);

    ItemDraft {
        name,
        category: Some(category),
        description: Some(CAPTURE_DESCRIPTION.to_string()),
        price: None,
        supplier: None,
    }
}
