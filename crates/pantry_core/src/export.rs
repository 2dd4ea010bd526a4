//! crates/pantry_core/src/export.rs
//!
//! CSV export of an inventory snapshot.

use crate::domain::InventoryItem;

pub const CSV_HEADER: &str = "name,category,description,price,supplier,quantity";

/// Renders the items as CSV, one row per item under a fixed header.
/// Fields containing a delimiter, quote or line break are quoted.
pub fn to_csv(items: &[InventoryItem]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for item in items {
        let quantity = item.quantity.to_string();
        let row = [
            item.name.as_str(),
            item.category.as_str(),
            item.description.as_str(),
            item.price.as_str(),
            item.supplier.as_str(),
            quantity.as_str(),
        ];
        lines.push(row.iter().map(|f| escape_field(f)).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
