//! Repository layer: the item and member directories and the loan journal.
//!
//! The ledger only relies on the narrow part of each directory (`get`,
//! `exists`, `set_available`). The remaining operations serve the catalog
//! and member services.

pub mod items;
pub mod loans;
pub mod members;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{BorrowingRecord, CreateItem, CreateMember, Item, ItemId, Member, MemberId, UpdateItem, UpdateMember},
};

/// Authoritative store of catalog items and their availability flag
#[async_trait]
pub trait ItemDirectory: Send + Sync {
    async fn get(&self, id: ItemId) -> AppResult<Option<Item>>;

    async fn exists(&self, id: ItemId) -> AppResult<bool>;

    /// Returns `false` when the item does not exist
    async fn set_available(&self, id: ItemId, available: bool) -> AppResult<bool>;

    async fn list(&self) -> AppResult<Vec<Item>>;

    async fn create(&self, item: &CreateItem) -> AppResult<Item>;

    async fn update(&self, id: ItemId, changes: &UpdateItem) -> AppResult<Option<Item>>;

    /// Physically remove an item. Callers go through the deletion guard first.
    async fn remove(&self, id: ItemId) -> AppResult<bool>;
}

/// Authoritative store of members
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn get(&self, id: MemberId) -> AppResult<Option<Member>>;

    async fn exists(&self, id: MemberId) -> AppResult<bool>;

    async fn list(&self) -> AppResult<Vec<Member>>;

    async fn create(&self, member: &CreateMember) -> AppResult<Member>;

    async fn update(&self, id: MemberId, changes: &UpdateMember) -> AppResult<Option<Member>>;

    async fn remove(&self, id: MemberId) -> AppResult<bool>;
}

/// Durable log of borrowing records
#[async_trait]
pub trait LoanJournal: Send + Sync {
    async fn load_all(&self) -> AppResult<Vec<BorrowingRecord>>;

    async fn record_borrow(&self, record: &BorrowingRecord) -> AppResult<()>;

    /// Persist the closing of `record` (which carries its `returned_at`)
    async fn record_return(&self, record: &BorrowingRecord) -> AppResult<()>;
}

/// Collaborators the services are built on
#[derive(Clone)]
pub struct Repository {
    pub pool: Option<Pool<Postgres>>,
    pub items: Arc<dyn ItemDirectory>,
    pub members: Arc<dyn MemberDirectory>,
    pub journal: Option<Arc<dyn LoanJournal>>,
}

impl Repository {
    /// Process-local directories, no journal
    pub fn in_memory() -> Self {
        Self {
            pool: None,
            items: Arc::new(memory::InMemoryItemDirectory::default()),
            members: Arc::new(memory::InMemoryMemberDirectory::default()),
            journal: None,
        }
    }

    /// PostgreSQL-backed directories and journal sharing one pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            items: Arc::new(items::PgItemDirectory::new(pool.clone())),
            members: Arc::new(members::PgMemberDirectory::new(pool.clone())),
            journal: Some(Arc::new(loans::PgLoanJournal::new(pool.clone()))),
            pool: Some(pool),
        }
    }

    /// Check that the backing database answers
    pub async fn ping(&self) -> bool {
        match &self.pool {
            Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
            None => true,
        }
    }
}
