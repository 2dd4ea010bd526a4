//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use pantry_core::inventory::InventorySync;
use pantry_core::domain::Session;
use pantry_core::ports::{DatabaseService, LabelDetectionService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// The service handles inside it live for the whole process.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub vision: Arc<dyn LabelDetectionService>,
}

impl AppState {
    /// An inventory controller for the caller's session, loaded with the
    /// current state of their collection.
    pub async fn inventory_for(&self, session: Session) -> InventorySync {
        InventorySync::for_session(self.db.clone(), session).await
    }
}
