//! Error types for the loan ledger

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    BadValue = 2,
    NoSuchItem = 10,
    NoSuchMember = 11,
    NoActiveLoan = 12,
    ItemAlreadyBorrowed = 20,
    DuplicateBorrow = 21,
    ItemAlreadyExists = 22,
    MemberAlreadyExists = 23,
    HasActiveLoans = 30,
    DependencyUnavailable = 40,
}

/// Which referenced thing was missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Item,
    Member,
    ActiveLoan,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundKind::Item => f.write_str("item"),
            NotFoundKind::Member => f.write_str("member"),
            NotFoundKind::ActiveLoan => f.write_str("active loan"),
        }
    }
}

/// Kinds of request that collide with existing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    AlreadyBorrowed,
    DuplicateBorrow,
    DuplicateIsbn,
    DuplicateEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidStateKind {
    HasActiveLoans,
}

/// Collaborators whose failures surface as `Unavailable`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    ItemDirectory,
    MemberDirectory,
    LoanJournal,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::ItemDirectory => f.write_str("item directory"),
            Dependency::MemberDirectory => f.write_str("member directory"),
            Dependency::LoanJournal => f.write_str("loan journal"),
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{kind} {id} does not exist")]
    NotFound { kind: NotFoundKind, id: String },

    #[error("Conflict: {message}")]
    Conflict { kind: ConflictKind, message: String },

    #[error("Invalid state: {message}")]
    InvalidState {
        kind: InvalidStateKind,
        message: String,
    },

    #[error("{dependency} unavailable: {message}")]
    Unavailable {
        dependency: Dependency,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: NotFoundKind, id: impl fmt::Display) -> Self {
        AppError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn conflict(kind: ConflictKind, message: impl Into<String>) -> Self {
        AppError::Conflict {
            kind,
            message: message.into(),
        }
    }

    pub fn has_active_loans(message: impl Into<String>) -> Self {
        AppError::InvalidState {
            kind: InvalidStateKind::HasActiveLoans,
            message: message.into(),
        }
    }

    pub fn unavailable(dependency: Dependency, cause: impl fmt::Display) -> Self {
        AppError::Unavailable {
            dependency,
            message: cause.to_string(),
        }
    }

    /// Numeric code reported to API clients
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound { kind, .. } => match kind {
                NotFoundKind::Item => ErrorCode::NoSuchItem,
                NotFoundKind::Member => ErrorCode::NoSuchMember,
                NotFoundKind::ActiveLoan => ErrorCode::NoActiveLoan,
            },
            AppError::Conflict { kind, .. } => match kind {
                ConflictKind::AlreadyBorrowed => ErrorCode::ItemAlreadyBorrowed,
                ConflictKind::DuplicateBorrow => ErrorCode::DuplicateBorrow,
                ConflictKind::DuplicateIsbn => ErrorCode::ItemAlreadyExists,
                ConflictKind::DuplicateEmail => ErrorCode::MemberAlreadyExists,
            },
            AppError::InvalidState { .. } => ErrorCode::HasActiveLoans,
            AppError::Unavailable { .. } => ErrorCode::DependencyUnavailable,
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorCode::BadValue,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Conflict { kind, message } => {
                let hint = match kind {
                    ConflictKind::AlreadyBorrowed => "item is already borrowed",
                    ConflictKind::DuplicateBorrow => "member already has this loan",
                    ConflictKind::DuplicateIsbn | ConflictKind::DuplicateEmail => "already exists",
                };
                (StatusCode::CONFLICT, format!("{}: {}", hint, message))
            }
            AppError::InvalidState { message, .. } => (
                StatusCode::CONFLICT,
                format!("cannot remove while on loan: {}", message),
            ),
            AppError::Unavailable { dependency, message } => {
                tracing::warn!("Dependency {} unavailable: {}", dependency, message);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("{} temporarily unavailable, retry the request", dependency),
                )
            }
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
