//! API handlers for the loan ledger REST endpoints

pub mod health;
pub mod items;
pub mod loans;
pub mod members;
pub mod openapi;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Items (catalog)
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/items/:id/loans", get(items::item_loans))
        // Members
        .route("/members", get(members::list_members).post(members::create_member))
        .route(
            "/members/:id",
            get(members::get_member)
                .put(members::update_member)
                .delete(members::delete_member),
        )
        .route("/members/:id/loans", get(members::member_loans))
        // Loans
        .route("/borrow/:item_id/member/:member_id", post(loans::borrow_item))
        .route("/return/:item_id/member/:member_id", put(loans::return_item))
        .route("/can-delete/:kind/:id", get(loans::can_delete))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
