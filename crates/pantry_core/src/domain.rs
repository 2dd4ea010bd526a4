//! crates/pantry_core/src/domain.rs
//!
//! Defines the pure, core data structures for the pantry application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Inventory
//=========================================================================================

/// The fixed set of categories an inventory item can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Beverage,
    Household,
    PersonalCare,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Beverage,
        Category::Household,
        Category::PersonalCare,
        Category::Other,
    ];

    /// The display name, which is also the stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Beverage => "Beverage",
            Category::Household => "Household",
            Category::PersonalCare => "Personal Care",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Matches the display name case-insensitively, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// The largest quantity an item can hold; the Postgres column is an `INTEGER`.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// A single item in a user's pantry. The `name` is the item's key within
/// the owning user's collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub name: String,
    pub category: Category,
    pub description: String,
    pub price: String,
    pub supplier: String,
    /// Never stored as zero; an item that would reach zero is deleted instead.
    pub quantity: u32,
}

/// The fields supplied when adding an item. Fields left as `None` are taken
/// from the existing document when the item already exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub supplier: Option<String>,
}

impl From<&InventoryItem> for ItemDraft {
    fn from(item: &InventoryItem) -> Self {
        Self {
            name: item.name.clone(),
            category: Some(item.category),
            description: Some(item.description.clone()),
            price: Some(item.price.clone()),
            supplier: Some(item.supplier.clone()),
        }
    }
}

/// The full replacement set of editable fields. Quantity is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub name: String,
    pub category: Category,
    pub description: String,
    pub price: String,
    pub supplier: String,
}

impl ItemFields {
    pub fn with_quantity(self, quantity: u32) -> InventoryItem {
        InventoryItem {
            name: self.name,
            category: self.category,
            description: self.description,
            price: self.price,
            supplier: self.supplier,
            quantity,
        }
    }
}

//=========================================================================================
// Image Classification
//=========================================================================================

/// One label returned by the label-detection service.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub description: String,
    pub confidence: f32,
}

/// The ordered label texts produced for one uploaded image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    pub labels: Vec<String>,
}

impl ClassificationResult {
    /// Keeps only the label text, in the order the service returned it.
    pub fn from_labels(labels: Vec<Label>) -> Self {
        Self {
            labels: labels.into_iter().map(|l| l.description).collect(),
        }
    }
}

/// A persisted classification, kept for traceability only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: Uuid,
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Accounts
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// The authenticated principal, backed by a browser session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
