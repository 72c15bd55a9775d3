//! Borrow and return endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{EntityKind, EntityRef, ItemId, MemberId},
    AppState,
};

/// Borrow confirmation
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    pub item_id: ItemId,
    pub member_id: MemberId,
    /// Borrowing record ID
    pub record_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    /// Status message
    pub message: String,
}

/// Return confirmation
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub item_id: ItemId,
    pub member_id: MemberId,
    pub record_id: Uuid,
    pub returned_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct CanDeleteResponse {
    pub deletable: bool,
}

/// Borrow an item
#[utoipa::path(
    post,
    path = "/borrow/{item_id}/member/{member_id}",
    tag = "loans",
    params(
        ("item_id" = i64, Path, description = "ID of the item to borrow"),
        ("member_id" = i64, Path, description = "ID of the borrowing member")
    ),
    responses(
        (status = 201, description = "Item borrowed", body = BorrowResponse),
        (status = 404, description = "Item or member not found"),
        (status = 409, description = "Item already borrowed"),
        (status = 503, description = "A directory is unavailable, retry")
    )
)]
pub async fn borrow_item(
    State(state): State<AppState>,
    Path((item_id, member_id)): Path<(ItemId, MemberId)>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let receipt = state.services.loans.borrow(item_id, member_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            item_id: receipt.item_id,
            member_id: receipt.member_id,
            record_id: receipt.record_id,
            borrowed_at: receipt.at,
            message: format!(
                "Item {} successfully borrowed by member {}",
                receipt.item_id, receipt.member_id
            ),
        }),
    ))
}

/// Return a borrowed item
#[utoipa::path(
    put,
    path = "/return/{item_id}/member/{member_id}",
    tag = "loans",
    params(
        ("item_id" = i64, Path, description = "ID of the item being returned"),
        ("member_id" = i64, Path, description = "ID of the returning member")
    ),
    responses(
        (status = 200, description = "Item returned", body = ReturnResponse),
        (status = 404, description = "No active loan for this item and member"),
        (status = 503, description = "A directory is unavailable, retry")
    )
)]
pub async fn return_item(
    State(state): State<AppState>,
    Path((item_id, member_id)): Path<(ItemId, MemberId)>,
) -> AppResult<Json<ReturnResponse>> {
    let receipt = state.services.loans.return_item(item_id, member_id).await?;

    Ok(Json(ReturnResponse {
        item_id: receipt.item_id,
        member_id: receipt.member_id,
        record_id: receipt.record_id,
        returned_at: receipt.at,
        message: format!(
            "Item {} successfully returned by member {}",
            receipt.item_id, receipt.member_id
        ),
    }))
}

/// Whether an item or member can be removed
#[utoipa::path(
    get,
    path = "/can-delete/{kind}/{id}",
    tag = "loans",
    params(
        ("kind" = EntityKind, Path, description = "item or member"),
        ("id" = i64, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Deletion guard verdict", body = CanDeleteResponse)
    )
)]
pub async fn can_delete(
    State(state): State<AppState>,
    Path((kind, id)): Path<(EntityKind, i64)>,
) -> Json<CanDeleteResponse> {
    Json(CanDeleteResponse {
        deletable: state.services.loans.can_delete(EntityRef::new(kind, id)),
    })
}
