//! Item (catalog) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{CreateItem, Item, ItemDetails, ItemId, LoanRecordView, UpdateItem},
    AppState,
};

/// List all items
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    responses(
        (status = 200, description = "List of items", body = Vec<Item>)
    )
)]
pub async fn list_items(State(state): State<AppState>) -> AppResult<Json<Vec<Item>>> {
    let items = state.services.catalog.list_items().await?;
    Ok(Json(items))
}

/// Get item details by ID
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item details", body = ItemDetails),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> AppResult<Json<ItemDetails>> {
    let item = state.services.catalog.get_item_details(id).await?;
    Ok(Json(item))
}

/// Create a new item
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    request_body = CreateItem,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "An item with this ISBN already exists")
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateItem>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let created = state.services.catalog.create_item(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an item
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(changes): Json<UpdateItem>,
) -> AppResult<Json<Item>> {
    let updated = state.services.catalog.update_item(id, changes).await?;
    Ok(Json(updated))
}

/// Delete an item
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item is on loan")
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Loan history of an item
#[utoipa::path(
    get,
    path = "/items/{id}/loans",
    tag = "items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Borrowing records, oldest first", body = Vec<LoanRecordView>),
        (status = 404, description = "Item not found")
    )
)]
pub async fn item_loans(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> AppResult<Json<Vec<LoanRecordView>>> {
    state.services.catalog.get_item(id).await?;
    Ok(Json(state.services.loans.item_history(id)))
}
