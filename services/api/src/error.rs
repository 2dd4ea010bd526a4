//! services/api/src/error.rs
//!
//! Startup and wiring failures of the pantry service. Request-level failures
//! are answered as `HandlerError` responses and never reach this type.

use crate::config::ConfigError;
use pantry_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A port adapter could not be constructed (e.g. the vision HTTP client).
    #[error("Adapter error: {0}")]
    Port(#[from] PortError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to apply migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Binding the listener, serving, or writing generated files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render OpenAPI document: {0}")]
    OpenApi(#[from] serde_json::Error),
}
