//! crates/pantry_core/src/inventory.rs
//!
//! The inventory-sync controller. It keeps a local snapshot of one user's item
//! collection and, after every mutation, re-reads the whole collection so the
//! snapshot always reflects committed store state rather than an optimistic patch.

use crate::capture::draft_from_labels;
use crate::domain::{InventoryItem, ItemDraft, ItemFields, Session, MAX_QUANTITY};
use crate::ports::{DatabaseService, PortError};
use crate::view::{page_view, Page, ViewQuery};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

//=========================================================================================
// Errors
//=========================================================================================

/// The mutation that failed, used to build the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Add,
    Remove,
    Delete,
    Update,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mutation::Add => "adding",
            Mutation::Remove => "removing",
            Mutation::Delete => "deleting",
            Mutation::Update => "updating",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// Rejected before any store call was made.
    #[error("{0}")]
    Validation(String),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Error {mutation} item.")]
    Remote {
        mutation: Mutation,
        #[source]
        source: PortError,
    },
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// How an increment treats the fields of an item that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    /// Fields the draft provides overwrite the stored ones.
    DraftWins,
    /// Only the quantity changes.
    KeepStored,
}

fn remote(mutation: Mutation) -> impl FnOnce(PortError) -> InventoryError {
    move |source| InventoryError::Remote { mutation, source }
}

//=========================================================================================
// Snapshot
//=========================================================================================

/// The last successfully fetched state of the user's collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub items: Vec<InventoryItem>,
    pub total_items: usize,
}

//=========================================================================================
// Controller
//=========================================================================================

/// Serializes mutation and refresh for one user's collection.
///
/// Every operation is a silent no-op while no session is active. Concurrent
/// refreshes are not coalesced; whichever finishes last replaces the snapshot.
pub struct InventorySync {
    db: Arc<dyn DatabaseService>,
    session: RwLock<Option<Session>>,
    snapshot: RwLock<Snapshot>,
}

impl InventorySync {
    /// Creates a controller with no active session.
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self {
            db,
            session: RwLock::new(None),
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    /// Creates a controller bound to an already authenticated session and loads
    /// its collection.
    pub async fn for_session(db: Arc<dyn DatabaseService>, session: Session) -> Self {
        let sync = Self::new(db);
        sync.on_session_change(Some(session)).await;
        sync
    }

    /// Reacts to sign-in and sign-out. The snapshot is always cleared; a new
    /// principal then triggers a refresh.
    pub async fn on_session_change(&self, session: Option<Session>) {
        let user_id = session.as_ref().map(|s| s.user_id);
        *self.session.write().await = session;
        *self.snapshot.write().await = Snapshot::default();
        if let Some(user_id) = user_id {
            self.refresh(user_id).await;
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Filters and paginates the local snapshot.
    pub async fn page(&self, query: &ViewQuery) -> Page {
        page_view(&self.snapshot.read().await.items, query)
    }

    async fn active_user(&self) -> Option<Uuid> {
        self.session.read().await.as_ref().map(|s| s.user_id)
    }

    /// Fetches the user's whole collection and swaps it in as the new snapshot.
    /// A failed fetch is logged and leaves the previous snapshot in place.
    pub async fn refresh(&self, user_id: Uuid) {
        match self.db.list_items(user_id).await {
            Ok(items) => {
                debug!(user_id = %user_id, count = items.len(), "Inventory refreshed");
                let total_items = items.len();
                *self.snapshot.write().await = Snapshot { items, total_items };
            }
            Err(e) => error!("Error fetching inventory for {}: {:?}", user_id, e),
        }
    }

    /// Adds one unit of the item, creating it with quantity 1 when absent.
    ///
    /// For an existing item the stored fields are kept, except those the draft
    /// explicitly provides.
    pub async fn add_or_increment(&self, draft: ItemDraft) -> InventoryResult<()> {
        self.upsert(draft, Merge::DraftWins).await
    }

    /// Adds the item described by a captured photo's labels. A photo of an
    /// item already in the collection only bumps its quantity.
    pub async fn add_from_labels(&self, labels: &[String]) -> InventoryResult<ItemDraft> {
        let draft = draft_from_labels(labels);
        self.upsert(draft.clone(), Merge::KeepStored).await?;
        Ok(draft)
    }

    async fn upsert(&self, draft: ItemDraft, merge: Merge) -> InventoryResult<()> {
        let Some(user_id) = self.active_user().await else {
            debug!("No user logged in; add skipped");
            return Ok(());
        };

        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(InventoryError::Validation("Item name is required.".to_string()));
        }
        let Some(category) = draft.category else {
            return Err(InventoryError::Validation("Category is required.".to_string()));
        };

        let existing = self
            .db
            .get_item(user_id, &name)
            .await
            .map_err(remote(Mutation::Add))?;

        let item = match existing {
            Some(existing) => {
                let quantity = existing
                    .quantity
                    .checked_add(1)
                    .filter(|q| *q <= MAX_QUANTITY)
                    .ok_or_else(|| {
                        InventoryError::Validation(format!(
                            "'{}' is already at the maximum quantity.",
                            name
                        ))
                    })?;
                match merge {
                    Merge::KeepStored => InventoryItem {
                        quantity,
                        ..existing
                    },
                    Merge::DraftWins => InventoryItem {
                        name,
                        category,
                        description: draft.description.unwrap_or(existing.description),
                        price: draft.price.unwrap_or(existing.price),
                        supplier: draft.supplier.unwrap_or(existing.supplier),
                        quantity,
                    },
                }
            }
            None => InventoryItem {
                name,
                category,
                description: draft.description.unwrap_or_default(),
                price: draft.price.unwrap_or_default(),
                supplier: draft.supplier.unwrap_or_default(),
                quantity: 1,
            },
        };

        self.db
            .set_item(user_id, &item)
            .await
            .map_err(remote(Mutation::Add))?;
        info!(item = %item.name, quantity = item.quantity, "Item added");

        self.refresh(user_id).await;
        Ok(())
    }

    /// Removes one unit; the last unit deletes the item. A missing item is
    /// ignored.
    pub async fn decrement(&self, name: &str) -> InventoryResult<()> {
        let Some(user_id) = self.active_user().await else {
            debug!("No user logged in; remove skipped");
            return Ok(());
        };

        let existing = self
            .db
            .get_item(user_id, name)
            .await
            .map_err(remote(Mutation::Remove))?;

        match existing {
            Some(item) if item.quantity <= 1 => {
                self.db
                    .delete_item(user_id, name)
                    .await
                    .map_err(remote(Mutation::Remove))?;
                info!(item = %name, "Last unit removed; item deleted");
            }
            Some(mut item) => {
                item.quantity -= 1;
                self.db
                    .set_item(user_id, &item)
                    .await
                    .map_err(remote(Mutation::Remove))?;
                info!(item = %name, quantity = item.quantity, "Item removed");
            }
            None => debug!(item = %name, "Remove of missing item ignored"),
        }

        self.refresh(user_id).await;
        Ok(())
    }

    /// Removes the item regardless of its quantity.
    pub async fn delete(&self, name: &str) -> InventoryResult<()> {
        let Some(user_id) = self.active_user().await else {
            debug!("No user logged in; delete skipped");
            return Ok(());
        };

        self.db
            .delete_item(user_id, name)
            .await
            .map_err(remote(Mutation::Delete))?;
        info!(item = %name, "Item deleted");

        self.refresh(user_id).await;
        Ok(())
    }

    /// Replaces the item at `existing_key` with `fields`, keeping its quantity.
    ///
    /// A changed name moves the item to the new key; the new name must not
    /// already belong to another item.
    pub async fn edit(&self, existing_key: &str, mut fields: ItemFields) -> InventoryResult<()> {
        let Some(user_id) = self.active_user().await else {
            debug!("No user logged in; edit skipped");
            return Ok(());
        };

        fields.name = fields.name.trim().to_string();
        if fields.name.is_empty() {
            return Err(InventoryError::Validation("Item name is required.".to_string()));
        }

        let quantity = match self.known_quantity(existing_key).await {
            Some(quantity) => quantity,
            None => self
                .db
                .get_item(user_id, existing_key)
                .await
                .map_err(remote(Mutation::Update))?
                .map(|item| item.quantity)
                .ok_or_else(|| InventoryError::NotFound(existing_key.to_string()))?,
        };

        let renamed = fields.name != existing_key;
        if renamed {
            let clash = self
                .db
                .get_item(user_id, &fields.name)
                .await
                .map_err(remote(Mutation::Update))?;
            if clash.is_some() {
                return Err(InventoryError::Validation(format!(
                    "An item named '{}' already exists.",
                    fields.name
                )));
            }
        }

        let item = fields.with_quantity(quantity);
        self.db
            .set_item(user_id, &item)
            .await
            .map_err(remote(Mutation::Update))?;
        if renamed {
            if let Err(e) = self.db.delete_item(user_id, existing_key).await {
                // Undo the copy so the item is not left under both names.
                if let Err(rollback) = self.db.delete_item(user_id, &item.name).await {
                    warn!(
                        "Failed to roll back rename of {} to {}: {:?}",
                        existing_key, item.name, rollback
                    );
                }
                self.refresh(user_id).await;
                return Err(remote(Mutation::Update)(e));
            }
        }
        info!(item = %existing_key, new_name = %item.name, "Item updated");

        self.refresh(user_id).await;
        Ok(())
    }

    async fn known_quantity(&self, name: &str) -> Option<u32> {
        self.snapshot
            .read()
            .await
            .items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.quantity)
    }
}
