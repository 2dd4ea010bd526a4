//! crates/pantry_core/src/memory.rs
//!
//! A process-local implementation of the `DatabaseService` port. It backs the
//! test suites and lets the service run without Postgres.

use crate::domain::{AuditRecord, InventoryItem, Session, User, UserCredentials};
use crate::ports::{DatabaseService, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserCredentials>,
    auth_sessions: HashMap<String, Session>,
    items: HashMap<Uuid, BTreeMap<String, InventoryItem>>,
    audit: Vec<AuditRecord>,
}

/// An in-memory database. Every call can be made to fail with
/// [`InMemoryDatabase::set_unavailable`] to simulate an unreachable store.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
    audit_unavailable: AtomicBool,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fails only the audit collection, leaving inventory and accounts working.
    pub fn set_audit_unavailable(&self, unavailable: bool) {
        self.audit_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn audit_records(&self) -> Vec<AuditRecord> {
        self.tables.lock().await.audit.clone()
    }

    fn check_available(&self) -> PortResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("database unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if tables.users.contains_key(email) {
            return Err(PortError::Conflict(format!("Email {} already registered", email)));
        }
        let credentials = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        let user = User {
            user_id: credentials.user_id,
            email: credentials.email.clone(),
        };
        tables.users.insert(email.to_string(), credentials);
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.check_available()?;
        self.tables
            .lock()
            .await
            .users
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.check_available()?;
        let session = Session {
            id: session_id.to_string(),
            user_id,
            expires_at,
        };
        self.tables
            .lock()
            .await
            .auth_sessions
            .insert(session_id.to_string(), session);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Session> {
        self.check_available()?;
        match self.tables.lock().await.auth_sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.clone()),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.check_available()?;
        self.tables.lock().await.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn list_items(&self, user_id: Uuid) -> PortResult<Vec<InventoryItem>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .get(&user_id)
            .map(|collection| collection.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_item(&self, user_id: Uuid, name: &str) -> PortResult<Option<InventoryItem>> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .get(&user_id)
            .and_then(|collection| collection.get(name))
            .cloned())
    }

    async fn set_item(&self, user_id: Uuid, item: &InventoryItem) -> PortResult<()> {
        self.check_available()?;
        self.tables
            .lock()
            .await
            .items
            .entry(user_id)
            .or_default()
            .insert(item.name.clone(), item.clone());
        Ok(())
    }

    async fn delete_item(&self, user_id: Uuid, name: &str) -> PortResult<()> {
        self.check_available()?;
        if let Some(collection) = self.tables.lock().await.items.get_mut(&user_id) {
            collection.remove(name);
        }
        Ok(())
    }

    async fn append_classification(&self, labels: &[String]) -> PortResult<Uuid> {
        self.check_available()?;
        if self.audit_unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("audit collection unavailable".to_string()));
        }
        let record = AuditRecord {
            id: Uuid::new_v4(),
            labels: labels.to_vec(),
            created_at: Utc::now(),
        };
        let id = record.id;
        self.tables.lock().await.audit.push(record);
        Ok(id)
    }
}
