//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use loan_ledger::{
    error::AppResult,
    models::{BorrowingRecord, CreateItem, CreateMember, Item, ItemId, Member, UpdateItem},
    repository::{
        memory::{InMemoryItemDirectory, InMemoryMemberDirectory},
        ItemDirectory, LoanJournal, MemberDirectory, Repository,
    },
    LoanLedger,
};

pub fn book(isbn: &str) -> CreateItem {
    CreateItem {
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        publication_year: 1965,
        isbn: isbn.to_string(),
        genre: "Science fiction".to_string(),
        price: None,
        description: Some("Desert planet".to_string()),
        page_count: 412,
    }
}

pub fn patron(email: &str) -> CreateMember {
    CreateMember {
        name: "Paul Atreides".to_string(),
        email: email.to_string(),
        phone: "+1 555 0100".to_string(),
        address: None,
    }
}

/// In-memory directories with handles kept for direct manipulation
pub struct Fixture {
    pub items: Arc<InMemoryItemDirectory>,
    pub members: Arc<InMemoryMemberDirectory>,
    pub repository: Repository,
}

impl Fixture {
    pub fn new() -> Self {
        let items = Arc::new(InMemoryItemDirectory::default());
        let members = Arc::new(InMemoryMemberDirectory::default());
        let repository = Repository {
            pool: None,
            items: items.clone(),
            members: members.clone(),
            journal: None,
        };
        Self {
            items,
            members,
            repository,
        }
    }

    pub fn ledger(&self) -> LoanLedger {
        LoanLedger::new(&self.repository)
    }

    pub async fn item(&self, isbn: &str) -> Item {
        self.items.create(&book(isbn)).await.expect("create item")
    }

    pub async fn member(&self, email: &str) -> Member {
        self.members.create(&patron(email)).await.expect("create member")
    }
}

/// Item directory that yields to the scheduler around every call, widening
/// the window in which unserialized operations would interleave.
pub struct SlowItems {
    pub inner: Arc<InMemoryItemDirectory>,
    pub delay: Duration,
}

impl SlowItems {
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

#[async_trait]
impl ItemDirectory for SlowItems {
    async fn get(&self, id: ItemId) -> AppResult<Option<Item>> {
        self.pause().await;
        self.inner.get(id).await
    }

    async fn exists(&self, id: ItemId) -> AppResult<bool> {
        self.pause().await;
        self.inner.exists(id).await
    }

    async fn set_available(&self, id: ItemId, available: bool) -> AppResult<bool> {
        self.pause().await;
        self.inner.set_available(id, available).await
    }

    async fn list(&self) -> AppResult<Vec<Item>> {
        self.inner.list().await
    }

    async fn create(&self, item: &CreateItem) -> AppResult<Item> {
        self.inner.create(item).await
    }

    async fn update(&self, id: ItemId, changes: &UpdateItem) -> AppResult<Option<Item>> {
        self.inner.update(id, changes).await
    }

    async fn remove(&self, id: ItemId) -> AppResult<bool> {
        self.inner.remove(id).await
    }
}

/// Journal that accepts every write after a pause
pub struct SlowJournal {
    pub delay: Duration,
}

#[async_trait]
impl LoanJournal for SlowJournal {
    async fn load_all(&self) -> AppResult<Vec<BorrowingRecord>> {
        Ok(Vec::new())
    }

    async fn record_borrow(&self, _record: &BorrowingRecord) -> AppResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn record_return(&self, _record: &BorrowingRecord) -> AppResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
