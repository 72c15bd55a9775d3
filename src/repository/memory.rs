//! In-process directories, used by the memory backend and by tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult, ConflictKind},
    models::{CreateItem, CreateMember, Item, ItemId, Member, MemberId, UpdateItem, UpdateMember},
};

use super::{ItemDirectory, MemberDirectory};

pub struct InMemoryItemDirectory {
    items: RwLock<BTreeMap<ItemId, Item>>,
    next_id: AtomicI64,
}

impl Default for InMemoryItemDirectory {
    fn default() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl ItemDirectory for InMemoryItemDirectory {
    async fn get(&self, id: ItemId) -> AppResult<Option<Item>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn exists(&self, id: ItemId) -> AppResult<bool> {
        Ok(self.items.read().await.contains_key(&id))
    }

    async fn set_available(&self, id: ItemId, available: bool) -> AppResult<bool> {
        let mut items = self.items.write().await;
        match items.get_mut(&id) {
            Some(item) => {
                item.available = available;
                item.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> AppResult<Vec<Item>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn create(&self, request: &CreateItem) -> AppResult<Item> {
        let mut items = self.items.write().await;
        if items.values().any(|i| i.isbn == request.isbn) {
            return Err(AppError::conflict(
                ConflictKind::DuplicateIsbn,
                format!("A book with ISBN {} already exists", request.isbn),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item = Item::from_request(id, request, Utc::now());
        items.insert(id, item.clone());
        Ok(item)
    }

    async fn update(&self, id: ItemId, changes: &UpdateItem) -> AppResult<Option<Item>> {
        let mut items = self.items.write().await;
        Ok(items.get_mut(&id).map(|item| {
            item.apply(changes, Utc::now());
            item.clone()
        }))
    }

    async fn remove(&self, id: ItemId) -> AppResult<bool> {
        Ok(self.items.write().await.remove(&id).is_some())
    }
}

pub struct InMemoryMemberDirectory {
    members: RwLock<BTreeMap<MemberId, Member>>,
    next_id: AtomicI64,
}

impl Default for InMemoryMemberDirectory {
    fn default() -> Self {
        Self {
            members: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl MemberDirectory for InMemoryMemberDirectory {
    async fn get(&self, id: MemberId) -> AppResult<Option<Member>> {
        Ok(self.members.read().await.get(&id).cloned())
    }

    async fn exists(&self, id: MemberId) -> AppResult<bool> {
        Ok(self.members.read().await.contains_key(&id))
    }

    async fn list(&self) -> AppResult<Vec<Member>> {
        Ok(self.members.read().await.values().cloned().collect())
    }

    async fn create(&self, request: &CreateMember) -> AppResult<Member> {
        let mut members = self.members.write().await;
        if members.values().any(|m| m.email == request.email) {
            return Err(AppError::conflict(
                ConflictKind::DuplicateEmail,
                format!("A patron with email {} already exists", request.email),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let member = Member::from_request(id, request, Utc::now());
        members.insert(id, member.clone());
        Ok(member)
    }

    async fn update(&self, id: MemberId, changes: &UpdateMember) -> AppResult<Option<Member>> {
        let mut members = self.members.write().await;
        if let Some(ref email) = changes.email {
            if members.values().any(|m| m.id != id && &m.email == email) {
                return Err(AppError::conflict(
                    ConflictKind::DuplicateEmail,
                    format!("A patron with email {} already exists", email),
                ));
            }
        }
        Ok(members.get_mut(&id).map(|member| {
            member.apply(changes, Utc::now());
            member.clone()
        }))
    }

    async fn remove(&self, id: MemberId) -> AppResult<bool> {
        Ok(self.members.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(isbn: &str) -> CreateItem {
        CreateItem {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            publication_year: 1965,
            isbn: isbn.to_string(),
            genre: "Science fiction".to_string(),
            price: None,
            description: None,
            page_count: 412,
        }
    }

    #[tokio::test]
    async fn test_duplicate_isbn_rejected() {
        let directory = InMemoryItemDirectory::default();
        directory.create(&book("9780441013593")).await.unwrap();

        let err = directory.create(&book("9780441013593")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict { kind: ConflictKind::DuplicateIsbn, .. }
        ));
    }

    #[tokio::test]
    async fn test_set_available_on_missing_item() {
        let directory = InMemoryItemDirectory::default();
        assert!(!directory.set_available(42, false).await.unwrap());

        let item = directory.create(&book("9780441013593")).await.unwrap();
        assert!(item.available);
        assert!(directory.set_available(item.id, false).await.unwrap());
        assert!(!directory.get(item.id).await.unwrap().unwrap().available);
    }
}
