//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pantry_core::domain::{Category, InventoryItem, Session, User, UserCredentials};
use pantry_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct AuthSessionRecord {
    id: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}
impl AuthSessionRecord {
    fn to_domain(self) -> Session {
        Session {
            id: self.id,
            user_id: self.user_id,
            expires_at: self.expires_at,
        }
    }
}

#[derive(FromRow)]
struct ItemRecord {
    name: String,
    category: String,
    description: String,
    price: String,
    supplier: String,
    quantity: i32,
}
impl ItemRecord {
    fn to_domain(self) -> PortResult<InventoryItem> {
        let category = self
            .category
            .parse::<Category>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            PortError::Unexpected(format!("Negative quantity stored for {}", self.name))
        })?;
        Ok(InventoryItem {
            name: self.name,
            category,
            description: self.description,
            price: self.price,
            supplier: self.supplier,
            quantity,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Email {} already registered", email))
            }
            other => unexpected(other),
        })?;

        Ok(User {
            user_id: record.user_id,
            email: record.email,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_credentials())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Session> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT id, user_id, expires_at FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(|r| r.to_domain()).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_items(&self, user_id: Uuid) -> PortResult<Vec<InventoryItem>> {
        let records = sqlx::query_as::<_, ItemRecord>(
            "SELECT name, category, description, price, supplier, quantity \
             FROM inventory_items WHERE user_id = $1 ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_item(&self, user_id: Uuid, name: &str) -> PortResult<Option<InventoryItem>> {
        let record = sqlx::query_as::<_, ItemRecord>(
            "SELECT name, category, description, price, supplier, quantity \
             FROM inventory_items WHERE user_id = $1 AND name = $2",
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        record.map(|r| r.to_domain()).transpose()
    }

    async fn set_item(&self, user_id: Uuid, item: &InventoryItem) -> PortResult<()> {
        let quantity = i32::try_from(item.quantity)
            .map_err(|_| PortError::Unexpected(format!("Quantity too large for {}", item.name)))?;
        sqlx::query(
            "INSERT INTO inventory_items (user_id, name, category, description, price, supplier, quantity) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, name) DO UPDATE SET \
                category = EXCLUDED.category, \
                description = EXCLUDED.description, \
                price = EXCLUDED.price, \
                supplier = EXCLUDED.supplier, \
                quantity = EXCLUDED.quantity",
        )
        .bind(user_id)
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(&item.description)
        .bind(&item.price)
        .bind(&item.supplier)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_item(&self, user_id: Uuid, name: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM inventory_items WHERE user_id = $1 AND name = $2")
            .bind(user_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn append_classification(&self, labels: &[String]) -> PortResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO classification_audit (id, labels) VALUES ($1, $2)")
            .bind(id)
            .bind(labels)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(id)
    }
}
