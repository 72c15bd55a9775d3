//! Member endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{CreateMember, LoanRecordView, Member, MemberDetails, MemberId, UpdateMember},
    AppState,
};

/// List all members
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    responses(
        (status = 200, description = "List of members", body = Vec<Member>)
    )
)]
pub async fn list_members(State(state): State<AppState>) -> AppResult<Json<Vec<Member>>> {
    let members = state.services.members.list_members().await?;
    Ok(Json(members))
}

/// Get member details, including open loans
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member details", body = MemberDetails),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<MemberId>,
) -> AppResult<Json<MemberDetails>> {
    let member = state.services.members.get_member_details(id).await?;
    Ok(Json(member))
}

/// Create a member
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    request_body = CreateMember,
    responses(
        (status = 201, description = "Member created", body = Member),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "A member with this email already exists")
    )
)]
pub async fn create_member(
    State(state): State<AppState>,
    Json(request): Json<CreateMember>,
) -> AppResult<(StatusCode, Json<Member>)> {
    let created = state.services.members.create_member(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a member
#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    request_body = UpdateMember,
    responses(
        (status = 200, description = "Member updated", body = Member),
        (status = 404, description = "Member not found")
    )
)]
pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<MemberId>,
    Json(changes): Json<UpdateMember>,
) -> AppResult<Json<Member>> {
    let updated = state.services.members.update_member(id, changes).await?;
    Ok(Json(updated))
}

/// Delete a member
#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 404, description = "Member not found"),
        (status = 409, description = "Member holds open loans")
    )
)]
pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<MemberId>,
) -> AppResult<StatusCode> {
    state.services.members.delete_member(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Loan history of a member
#[utoipa::path(
    get,
    path = "/members/{id}/loans",
    tag = "members",
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Borrowing records, oldest first", body = Vec<LoanRecordView>),
        (status = 404, description = "Member not found")
    )
)]
pub async fn member_loans(
    State(state): State<AppState>,
    Path(id): Path<MemberId>,
) -> AppResult<Json<Vec<LoanRecordView>>> {
    state.services.members.get_member(id).await?;
    Ok(Json(state.services.loans.member_history(id)))
}
