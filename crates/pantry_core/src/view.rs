//! crates/pantry_core/src/view.rs
//!
//! The derived, read-only view over a local inventory snapshot: search,
//! category filter and fixed-size pagination. Nothing here touches a store.

use crate::domain::{Category, InventoryItem};

/// Number of items shown per page.
pub const PAGE_SIZE: usize = 10;

/// The search and pagination state of the inventory table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub category: Option<Category>,
    /// 1-based; `0` is treated as the first page.
    pub page: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: None,
            page: 1,
        }
    }
}

/// One page of the filtered inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<InventoryItem>,
    pub total_items: usize,
    pub filtered_items: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Case-insensitive substring match on the name, and exact category match
/// when a category is selected.
pub fn filter<'a>(
    items: &'a [InventoryItem],
    search: &str,
    category: Option<Category>,
) -> Vec<&'a InventoryItem> {
    let needle = search.to_lowercase();
    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .filter(|item| category.map_or(true, |c| item.category == c))
        .collect()
}

/// Returns the slice of `items` that falls on the given 1-based page.
pub fn paginate<T>(items: &[T], page: usize) -> &[T] {
    let start = page.max(1).saturating_sub(1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

/// Filters then paginates the snapshot.
pub fn page_view(items: &[InventoryItem], query: &ViewQuery) -> Page {
    let filtered = filter(items, &query.search, query.category);
    let page = query.page.max(1);
    Page {
        items: paginate(&filtered, page).iter().map(|&i| i.clone()).collect(),
        total_items: items.len(),
        filtered_items: filtered.len(),
        page,
        page_size: PAGE_SIZE,
        total_pages: filtered.len().div_ceil(PAGE_SIZE).max(1),
    }
}
