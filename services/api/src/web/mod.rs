pub mod auth;
pub mod classify;
pub mod inventory;
pub mod middleware;
pub mod rest;
pub mod state;

pub use classify::classify_image_handler;
pub use middleware::require_auth;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{any, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::web::auth::{login_handler, logout_handler, signup_handler};
use crate::web::inventory::{
    add_item_handler, capture_item_handler, decrement_item_handler, delete_item_handler,
    edit_item_handler, export_csv_handler, list_inventory_handler,
};
use crate::web::state::AppState;

/// Builds the API router: public auth and classification routes, and the
/// inventory routes behind `require_auth`.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/api/classifyImage", any(classify_image_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/inventory", get(list_inventory_handler))
        .route("/api/inventory/items", post(add_item_handler))
        .route(
            "/api/inventory/items/{name}",
            put(edit_item_handler).delete(delete_item_handler),
        )
        .route(
            "/api/inventory/items/{name}/decrement",
            post(decrement_item_handler),
        )
        .route("/api/inventory/export.csv", get(export_csv_handler))
        .route("/api/inventory/capture", post(capture_item_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .with_state(app_state)
}
