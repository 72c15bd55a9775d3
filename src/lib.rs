//! Loan Ledger
//!
//! Tracks which catalog items are on loan to which member and guarantees that
//! an item is lent to at most one member at a time, including under
//! concurrent borrow and return requests. Exposed as a library and as a
//! REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use ledger::LoanLedger;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, services: services::Services) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
