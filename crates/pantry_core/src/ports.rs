//! crates/pantry_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete document store and label-detection service.

use crate::domain::{InventoryItem, Label, Session, User, UserCredentials};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    /// Fails with `PortError::Conflict` when the email is already registered.
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves an unexpired auth session, or `PortError::Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Session>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Inventory Documents (keyed by user and item name) ---
    /// Returns every item of the user's collection, ordered by name.
    async fn list_items(&self, user_id: Uuid) -> PortResult<Vec<InventoryItem>>;

    async fn get_item(&self, user_id: Uuid, name: &str) -> PortResult<Option<InventoryItem>>;

    /// Creates or fully overwrites the document at `item.name`.
    async fn set_item(&self, user_id: Uuid, item: &InventoryItem) -> PortResult<()>;

    /// Removes the document; removing a missing document is not an error.
    async fn delete_item(&self, user_id: Uuid, name: &str) -> PortResult<()>;

    // --- Classification Audit ---
    /// Appends a `{labels}` record and returns its server-generated key.
    async fn append_classification(&self, labels: &[String]) -> PortResult<Uuid>;
}

#[async_trait]
pub trait LabelDetectionService: Send + Sync {
    /// Returns the labels detected in the image, highest confidence first.
    async fn detect_labels(&self, image: &[u8]) -> PortResult<Vec<Label>>;
}
