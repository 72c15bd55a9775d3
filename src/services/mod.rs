//! Business logic services

pub mod catalog;
pub mod loans;
pub mod members;

use std::sync::Arc;

use crate::{
    cache::EntityCache,
    config::CacheConfig,
    ledger::LoanLedger,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub loans: loans::LoansService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, cache_config: &CacheConfig) -> Self {
        let item_cache = Arc::new(EntityCache::new(cache_config));
        let member_cache = Arc::new(EntityCache::new(cache_config));
        let ledger = Arc::new(LoanLedger::new(&repository).with_item_cache(item_cache.clone()));

        Self {
            catalog: catalog::CatalogService::new(repository.items.clone(), ledger.clone(), item_cache),
            members: members::MembersService::new(repository.members.clone(), ledger.clone(), member_cache),
            loans: loans::LoansService::new(ledger),
            repository,
        }
    }

    /// Whether the backing storage answers
    pub async fn ready(&self) -> bool {
        self.repository.ping().await
    }
}
