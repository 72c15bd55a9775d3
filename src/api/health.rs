//! Liveness and readiness probes

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{config::StorageBackend, AppState};

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy`, `ready` or `unavailable`
    pub status: String,
    pub version: String,
}

/// Readiness report including the ledger's view of loans
#[derive(Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub status: String,
    /// `memory` or `postgres`
    pub storage: String,
    /// Loans currently open in the ledger
    pub open_loans: usize,
}

/// Process is up
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Storage answers and the ledger is loaded
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Ready to serve loans", body = ReadinessResponse),
        (status = 503, description = "Storage is not reachable", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let (code, status) = if state.services.ready().await {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    let storage = match state.config.storage.backend {
        StorageBackend::Memory => "memory",
        StorageBackend::Postgres => "postgres",
    };

    (
        code,
        Json(ReadinessResponse {
            status: status.into(),
            storage: storage.into(),
            open_loans: state.services.loans.ledger().open_loan_count(),
        }),
    )
}
