//! Catalog management service

use std::sync::Arc;

use validator::Validate;

use crate::{
    cache::EntityCache,
    error::{AppError, AppResult, NotFoundKind},
    ledger::LoanLedger,
    models::{CreateItem, EntityRef, Item, ItemDetails, ItemId, UpdateItem},
    repository::ItemDirectory,
};

#[derive(Clone)]
pub struct CatalogService {
    items: Arc<dyn ItemDirectory>,
    ledger: Arc<LoanLedger>,
    cache: Arc<EntityCache<ItemId, Item>>,
}

impl CatalogService {
    pub fn new(
        items: Arc<dyn ItemDirectory>,
        ledger: Arc<LoanLedger>,
        cache: Arc<EntityCache<ItemId, Item>>,
    ) -> Self {
        Self { items, ledger, cache }
    }

    /// List all items
    pub async fn list_items(&self) -> AppResult<Vec<Item>> {
        self.cache.list_or_load(|| self.items.list()).await
    }

    /// Get item by ID
    pub async fn get_item(&self, id: ItemId) -> AppResult<Item> {
        self.cache
            .get_or_load(&id, || self.items.get(id))
            .await?
            .ok_or_else(|| AppError::not_found(NotFoundKind::Item, id))
    }

    /// Get item with its current loan status.
    ///
    /// Reads through the ledger rather than the cache: the flag and the open
    /// record must come from the same instant.
    pub async fn get_item_details(&self, id: ItemId) -> AppResult<ItemDetails> {
        let state = self.ledger.snapshot(id).await?;
        let item = state
            .item
            .ok_or_else(|| AppError::not_found(NotFoundKind::Item, id))?;
        Ok(ItemDetails {
            currently_borrowed: state.open_record.is_some(),
            item,
        })
    }

    /// Create a new item
    pub async fn create_item(&self, request: CreateItem) -> AppResult<Item> {
        request.validate()?;
        let item = self.items.create(&request).await?;
        self.cache.invalidate_listing();
        tracing::info!("Created item id={} isbn={}", item.id, item.isbn);
        Ok(item)
    }

    /// Update descriptive fields of an item
    pub async fn update_item(&self, id: ItemId, changes: UpdateItem) -> AppResult<Item> {
        changes.validate()?;
        let updated = self
            .items
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::not_found(NotFoundKind::Item, id))?;
        self.cache.invalidate(&id);
        Ok(updated)
    }

    /// Delete an item that has no open loan
    pub async fn delete_item(&self, id: ItemId) -> AppResult<()> {
        self.ledger
            .remove_guarded(EntityRef::Item(id), || self.items.remove(id))
            .await?;
        tracing::info!("Deleted item id={}", id);
        Ok(())
    }
}
