//! services/api/src/web/inventory.rs
//!
//! Contains the Axum handlers for the signed-in user's inventory. Each request
//! binds an `InventorySync` controller to the caller's session, performs one
//! operation (which refreshes the collection) and answers with the derived
//! page view.

use crate::web::classify::{classify_file, spool_image};
use crate::web::rest::{
    fail, CaptureResponse, ErrorBody, HandlerError, ItemResponse, PageResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use pantry_core::domain::{Category, ItemDraft, ItemFields, Session};
use pantry_core::export::to_csv;
use pantry_core::inventory::{InventoryError, InventorySync};
use pantry_core::view::ViewQuery;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Request Payloads
//=========================================================================================

/// Search, category filter and page of the inventory table.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Case-insensitive substring of the item name.
    pub search: Option<String>,
    /// Exact category; empty means all categories.
    pub category: Option<String>,
    /// 1-based page number.
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub supplier: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditItemRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub supplier: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Empty means "not provided"; anything else must name a known category.
fn parse_category(raw: Option<&str>) -> Result<Option<Category>, HandlerError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<Category>()
            .map(Some)
            .map_err(|e| fail(StatusCode::BAD_REQUEST, e.to_string())),
    }
}

fn view_query(params: &ListParams) -> Result<ViewQuery, HandlerError> {
    Ok(ViewQuery {
        search: params.search.clone().unwrap_or_default(),
        category: parse_category(params.category.as_deref())?,
        page: params.page.unwrap_or(1),
    })
}

fn inventory_error(e: InventoryError) -> HandlerError {
    match e {
        InventoryError::Validation(message) => fail(StatusCode::BAD_REQUEST, message),
        InventoryError::NotFound(name) => {
            fail(StatusCode::NOT_FOUND, format!("Item '{}' not found", name))
        }
        remote @ InventoryError::Remote { .. } => {
            error!("Inventory mutation failed: {:?}", remote);
            fail(StatusCode::INTERNAL_SERVER_ERROR, remote.to_string())
        }
    }
}

async fn page_of(sync: &InventorySync, params: &ListParams) -> Result<PageResponse, HandlerError> {
    Ok(sync.page(&view_query(params)?).await.into())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List the signed-in user's inventory.
#[utoipa::path(
    get,
    path = "/api/inventory",
    params(ListParams),
    responses(
        (status = 200, description = "One page of the filtered inventory", body = PageResponse),
        (status = 400, description = "Unknown category", body = ErrorBody),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn list_inventory_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse>, HandlerError> {
    let query = view_query(&params)?;
    let sync = state.inventory_for(session).await;
    Ok(Json(sync.page(&query).await.into()))
}

/// Add one unit of an item, creating it when it does not exist yet.
#[utoipa::path(
    post,
    path = "/api/inventory/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Item added; first page of the inventory", body = PageResponse),
        (status = 400, description = "Missing name or category", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn add_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<PageResponse>, HandlerError> {
    let draft = ItemDraft {
        name: req.name,
        category: parse_category(req.category.as_deref())?,
        description: req.description,
        price: req.price,
        supplier: req.supplier,
    };

    let sync = state.inventory_for(session).await;
    sync.add_or_increment(draft).await.map_err(inventory_error)?;
    Ok(Json(page_of(&sync, &ListParams::default()).await?))
}

/// Remove one unit of an item; the last unit deletes it.
#[utoipa::path(
    post,
    path = "/api/inventory/items/{name}/decrement",
    params(("name" = String, Path, description = "The item name.")),
    responses(
        (status = 200, description = "Item decremented (or already absent)", body = PageResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn decrement_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
) -> Result<Json<PageResponse>, HandlerError> {
    let sync = state.inventory_for(session).await;
    sync.decrement(&name).await.map_err(inventory_error)?;
    Ok(Json(page_of(&sync, &ListParams::default()).await?))
}

/// Delete an item regardless of its quantity.
#[utoipa::path(
    delete,
    path = "/api/inventory/items/{name}",
    params(("name" = String, Path, description = "The item name.")),
    responses(
        (status = 200, description = "Item deleted (or already absent)", body = PageResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn delete_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
) -> Result<Json<PageResponse>, HandlerError> {
    let sync = state.inventory_for(session).await;
    sync.delete(&name).await.map_err(inventory_error)?;
    Ok(Json(page_of(&sync, &ListParams::default()).await?))
}

/// Replace an item's fields, keeping its quantity.
#[utoipa::path(
    put,
    path = "/api/inventory/items/{name}",
    params(("name" = String, Path, description = "The current item name.")),
    request_body = EditItemRequest,
    responses(
        (status = 200, description = "Item updated", body = PageResponse),
        (status = 400, description = "Invalid fields or name already taken", body = ErrorBody),
        (status = 404, description = "Item not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn edit_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
    Json(req): Json<EditItemRequest>,
) -> Result<Json<PageResponse>, HandlerError> {
    let category = parse_category(Some(&req.category))?
        .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "Category is required."))?;
    let fields = ItemFields {
        name: req.name,
        category,
        description: req.description,
        price: req.price,
        supplier: req.supplier,
    };

    let sync = state.inventory_for(session).await;
    sync.edit(&name, fields).await.map_err(inventory_error)?;
    Ok(Json(page_of(&sync, &ListParams::default()).await?))
}

/// Download the whole inventory as CSV.
#[utoipa::path(
    get,
    path = "/api/inventory/export.csv",
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn export_csv_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> impl IntoResponse {
    let sync = state.inventory_for(session).await;
    let csv = to_csv(&sync.snapshot().await.items);
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inventory.csv\"",
            ),
        ],
        csv,
    )
}

/// Classify a captured photo and add the item its labels describe.
#[utoipa::path(
    post,
    path = "/api/inventory/capture",
    request_body(content_type = "multipart/form-data", description = "The captured photo, in the `image` field."),
    responses(
        (status = 200, description = "Item added from the photo", body = CaptureResponse),
        (status = 400, description = "No image file in the form", body = ErrorBody),
        (status = 422, description = "No labels detected", body = ErrorBody),
        (status = 500, description = "Parse, classification or store failure", body = ErrorBody)
    )
)]
pub async fn capture_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Json<CaptureResponse>, HandlerError> {
    let file = spool_image(&mut multipart, &state.config.upload_dir).await?;
    let result = classify_file(&state, &file).await?;
    drop(file);

    if result.labels.is_empty() {
        return Err(fail(
            StatusCode::UNPROCESSABLE_ENTITY,
            "No labels received for the image",
        ));
    }

    let sync = state.inventory_for(session).await;
    let draft = sync
        .add_from_labels(&result.labels)
        .await
        .map_err(inventory_error)?;

    let item = sync
        .snapshot()
        .await
        .items
        .into_iter()
        .find(|i| i.name == draft.name)
        .map(ItemResponse::from);

    Ok(Json(CaptureResponse {
        labels: result.labels,
        item,
        page: page_of(&sync, &ListParams::default()).await?,
    }))
}
