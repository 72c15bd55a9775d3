//! Deletion guard: items and members with open loans cannot be removed.

use std::future::Future;

use tracing::debug;

use crate::{
    error::{AppError, AppResult, NotFoundKind},
    models::EntityRef,
};

use super::LoanLedger;

impl LoanLedger {
    /// True when no open loan references `entity`
    pub fn can_delete(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Item(id) => !self.records.has_open_for_item(id),
            EntityRef::Member(id) => !self.records.has_open_for_member(id),
        }
    }

    /// Run `remove` while holding the entity's slot, after checking that no
    /// open loan references it.
    ///
    /// `remove` reports whether a row was deleted; `false` becomes a
    /// not-found error.
    pub async fn remove_guarded<F, Fut>(&self, entity: EntityRef, remove: F) -> AppResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<bool>>,
    {
        let (_slot_item, _slot_member, kind, id) = match entity {
            EntityRef::Item(id) => (
                Some(self.item_slots.acquire(id).await),
                None,
                NotFoundKind::Item,
                id,
            ),
            EntityRef::Member(id) => (
                None,
                Some(self.member_slots.acquire(id).await),
                NotFoundKind::Member,
                id,
            ),
        };

        if !self.can_delete(entity) {
            debug!("Refusing to delete {:?}: open loans", entity);
            return Err(AppError::has_active_loans(format!(
                "{} {} has active borrowing records",
                kind, id
            )));
        }

        if !remove().await? {
            return Err(AppError::not_found(kind, id));
        }

        if let EntityRef::Item(id) = entity {
            self.invalidate(id);
        }
        Ok(())
    }
}
