//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, items, loans, members};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Loan Ledger API",
        version = "0.1.0",
        description = "Tracks which catalog items are on loan to which member",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Items
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        items::item_loans,
        // Members
        members::list_members,
        members::get_member,
        members::create_member,
        members::update_member,
        members::delete_member,
        members::member_loans,
        // Loans
        loans::borrow_item,
        loans::return_item,
        loans::can_delete,
    ),
    components(
        schemas(
            // Items
            crate::models::item::Item,
            crate::models::item::ItemDetails,
            crate::models::item::CreateItem,
            crate::models::item::UpdateItem,
            // Members
            crate::models::member::Member,
            crate::models::member::MemberDetails,
            crate::models::member::CreateMember,
            crate::models::member::UpdateMember,
            // Loans
            crate::models::loan::LoanRecordView,
            crate::models::loan::EntityKind,
            loans::BorrowResponse,
            loans::ReturnResponse,
            loans::CanDeleteResponse,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "items", description = "Catalog item management"),
        (name = "members", description = "Member management"),
        (name = "loans", description = "Borrowing and returning items")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
