//! services/api/src/web/rest.rs
//!
//! Contains the shared REST payload types, the error shape returned by every
//! handler, and the master definition for the OpenAPI specification.

use crate::web::{auth, classify, inventory};
use axum::{http::StatusCode, Json};
use pantry_core::domain::InventoryItem;
use pantry_core::view::Page;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        classify::classify_image_handler,
        inventory::list_inventory_handler,
        inventory::add_item_handler,
        inventory::decrement_item_handler,
        inventory::delete_item_handler,
        inventory::edit_item_handler,
        inventory::export_csv_handler,
        inventory::capture_item_handler,
    ),
    components(
        schemas(
            ErrorBody,
            ItemResponse,
            PageResponse,
            ClassifyResponse,
            CaptureResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            inventory::AddItemRequest,
            inventory::EditItemRequest,
        )
    ),
    tags(
        (name = "Pantry API", description = "Pantry inventory and image classification endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// The error half of every handler's result.
pub type HandlerError = (StatusCode, Json<ErrorBody>);

pub fn fail(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemResponse {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: String,
    pub supplier: String,
    pub quantity: u32,
}

impl From<InventoryItem> for ItemResponse {
    fn from(item: InventoryItem) -> Self {
        Self {
            name: item.name,
            category: item.category.to_string(),
            description: item.description,
            price: item.price,
            supplier: item.supplier,
            quantity: item.quantity,
        }
    }
}

/// One page of the caller's filtered inventory.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageResponse {
    pub items: Vec<ItemResponse>,
    pub total_items: usize,
    pub filtered_items: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            items: page.items.into_iter().map(ItemResponse::from).collect(),
            total_items: page.total_items,
            filtered_items: page.filtered_items,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
        }
    }
}

/// The labels detected in an uploaded image, highest confidence first.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClassifyResponse {
    pub labels: Vec<String>,
}

/// The result of adding an item from a captured photo.
#[derive(Debug, Serialize, ToSchema)]
pub struct CaptureResponse {
    pub labels: Vec<String>,
    /// The stored item after the add, when it is visible in the refreshed inventory.
    pub item: Option<ItemResponse>,
    pub page: PageResponse,
}
