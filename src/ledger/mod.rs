//! Loan ledger: borrow and return under per-item serialization.
//!
//! For every item, `available == false` holds exactly when the ledger has an
//! open borrowing record for it. Both facts change inside the item's
//! serializer slot, and the record index is only touched once every
//! fallible write has succeeded, so a failed operation leaves no trace.

pub mod guard;
pub mod records;
pub mod serializer;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    cache::EntityCache,
    error::{AppError, AppResult, ConflictKind, NotFoundKind},
    models::{BorrowingRecord, Item, ItemId, LoanReceipt, MemberId},
    repository::{ItemDirectory, LoanJournal, MemberDirectory, Repository},
};

use records::{RecordBook, RestoreSummary};
use serializer::KeyedSerializer;

/// Consistent view of one item's loan state
#[derive(Debug, Clone, PartialEq)]
pub struct ItemLoanState {
    /// Directory entry, `None` when the item does not exist
    pub item: Option<Item>,
    /// Directory flag, `None` when the item does not exist
    pub available: Option<bool>,
    pub open_record: Option<BorrowingRecord>,
}

impl ItemLoanState {
    /// Whether the flag and the record index agree
    pub fn is_consistent(&self) -> bool {
        match self.available {
            Some(available) => available == self.open_record.is_none(),
            None => true,
        }
    }
}

/// Corrections made by [`LoanLedger::reconcile`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub checked: usize,
    pub marked_available: Vec<ItemId>,
    pub marked_unavailable: Vec<ItemId>,
}

pub struct LoanLedger {
    items: Arc<dyn ItemDirectory>,
    members: Arc<dyn MemberDirectory>,
    journal: Option<Arc<dyn LoanJournal>>,
    item_cache: Option<Arc<EntityCache<ItemId, Item>>>,
    records: RecordBook,
    item_slots: KeyedSerializer<ItemId>,
    member_slots: KeyedSerializer<MemberId>,
}

impl LoanLedger {
    pub fn new(repository: &Repository) -> Self {
        Self {
            items: repository.items.clone(),
            members: repository.members.clone(),
            journal: repository.journal.clone(),
            item_cache: None,
            records: RecordBook::new(),
            item_slots: KeyedSerializer::new(),
            member_slots: KeyedSerializer::new(),
        }
    }

    /// Invalidate `cache` entries for items whose loan state changes
    pub fn with_item_cache(mut self, cache: Arc<EntityCache<ItemId, Item>>) -> Self {
        self.item_cache = Some(cache);
        self
    }

    /// Lend `item_id` to `member_id`
    #[instrument(skip(self))]
    pub async fn borrow(&self, item_id: ItemId, member_id: MemberId) -> AppResult<LoanReceipt> {
        let started = Instant::now();
        let _item_slot = self.item_slots.acquire(item_id).await;
        let _member_slot = self.member_slots.acquire(member_id).await;

        let item = self
            .items
            .get(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(NotFoundKind::Item, item_id))?;

        if !self.members.exists(member_id).await? {
            return Err(AppError::not_found(NotFoundKind::Member, member_id));
        }

        if !item.available {
            debug!("Item {} is not available", item_id);
            return Err(AppError::conflict(
                ConflictKind::AlreadyBorrowed,
                format!("Item {} is already borrowed", item_id),
            ));
        }

        if self.records.open_for_pair(item_id, member_id).is_some() {
            warn!("Item {} flagged available while member {} holds it", item_id, member_id);
            return Err(AppError::conflict(
                ConflictKind::DuplicateBorrow,
                format!("Member {} already has borrowed item {}", member_id, item_id),
            ));
        }

        if let Some(open) = self.records.open_for_item(item_id) {
            warn!(
                "Item {} flagged available while on loan to member {}",
                item_id,
                open.member_id()
            );
            return Err(AppError::conflict(
                ConflictKind::AlreadyBorrowed,
                format!("Item {} is already borrowed", item_id),
            ));
        }

        let record = BorrowingRecord::open(item_id, member_id, Utc::now());

        if !self.items.set_available(item_id, false).await? {
            return Err(AppError::not_found(NotFoundKind::Item, item_id));
        }

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record_borrow(&record).await {
                self.revert_availability(item_id, true).await;
                return Err(e);
            }
        }

        let receipt = LoanReceipt {
            item_id,
            member_id,
            record_id: record.id(),
            at: record.borrowed_at(),
        };
        if !self.records.insert(record) {
            // Unreachable while the slot is held and the open check above passed.
            return Err(AppError::Internal(format!(
                "Item {} gained an open record during borrow",
                item_id
            )));
        }
        self.invalidate(item_id);

        info!(
            "Item {} borrowed by member {} in {:?}",
            item_id,
            member_id,
            started.elapsed()
        );
        Ok(receipt)
    }

    /// Close the open loan of `item_id` held by `member_id`.
    ///
    /// If the item has been removed from the directory in the meantime the
    /// loan is still closed and the call succeeds; there is no flag left to
    /// flip.
    #[instrument(skip(self))]
    pub async fn return_item(&self, item_id: ItemId, member_id: MemberId) -> AppResult<LoanReceipt> {
        let started = Instant::now();
        let _item_slot = self.item_slots.acquire(item_id).await;

        let open = self.records.open_for_pair(item_id, member_id).ok_or_else(|| {
            AppError::not_found(
                NotFoundKind::ActiveLoan,
                format!("for item {} and member {}", item_id, member_id),
            )
        })?;

        let flipped = self.items.set_available(item_id, true).await?;
        if !flipped {
            warn!(
                "Item {} no longer exists, closing loan {} without availability update",
                item_id,
                open.id()
            );
        }

        let returned_at = Utc::now();
        if let Some(journal) = &self.journal {
            let closed = open
                .closed(returned_at)
                .ok_or_else(|| AppError::Internal(format!("Loan {} already closed", open.id())))?;
            if let Err(e) = journal.record_return(&closed).await {
                if flipped {
                    self.revert_availability(item_id, false).await;
                }
                return Err(e);
            }
        }

        self.records.close(open.id(), returned_at).ok_or_else(|| {
            AppError::Internal(format!("Loan {} closed during return", open.id()))
        })?;
        self.invalidate(item_id);

        info!(
            "Item {} returned by member {} in {:?}",
            item_id,
            member_id,
            started.elapsed()
        );
        Ok(LoanReceipt {
            item_id,
            member_id,
            record_id: open.id(),
            at: returned_at,
        })
    }

    /// Whether an open loan references `item_id`
    pub fn is_currently_borrowed(&self, item_id: ItemId) -> bool {
        self.records.has_open_for_item(item_id)
    }

    /// Read the directory entry and the open record together, so a borrow or
    /// return in flight is never seen half-applied
    pub async fn snapshot(&self, item_id: ItemId) -> AppResult<ItemLoanState> {
        let _item_slot = self.item_slots.acquire(item_id).await;
        let item = self.items.get(item_id).await?;
        Ok(ItemLoanState {
            available: item.as_ref().map(|item| item.available),
            item,
            open_record: self.records.open_for_item(item_id),
        })
    }

    pub fn records_for_item(&self, item_id: ItemId) -> Vec<BorrowingRecord> {
        self.records.history_for_item(item_id)
    }

    pub fn records_for_member(&self, member_id: MemberId) -> Vec<BorrowingRecord> {
        self.records.history_for_member(member_id)
    }

    pub fn open_loans_for_member(&self, member_id: MemberId) -> Vec<BorrowingRecord> {
        self.records.open_for_member(member_id)
    }

    pub fn open_loan_count(&self) -> usize {
        self.records.open_count()
    }

    /// Load the journal into the record index
    pub async fn hydrate(&self) -> AppResult<RestoreSummary> {
        let Some(journal) = &self.journal else {
            return Ok(RestoreSummary::default());
        };

        let summary = self.records.restore(journal.load_all().await?);
        for id in &summary.conflicting {
            error!("Journal holds a second open loan {} for an item, ignoring it", id);
        }
        info!(
            "Loaded {} borrowing records ({} open)",
            summary.loaded, summary.open
        );
        Ok(summary)
    }

    /// Bring directory flags back in line with the open records
    pub async fn reconcile(&self) -> AppResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for item in self.items.list().await? {
            let _item_slot = self.item_slots.acquire(item.id).await;
            report.checked += 1;

            let Some(current) = self.items.get(item.id).await? else {
                continue;
            };
            let borrowed = self.records.has_open_for_item(item.id);

            if !current.available && !borrowed {
                warn!("Item {} flagged unavailable without an open loan, fixing", item.id);
                if self.items.set_available(item.id, true).await? {
                    report.marked_available.push(item.id);
                }
            } else if current.available && borrowed {
                warn!("Item {} flagged available while on loan, fixing", item.id);
                if self.items.set_available(item.id, false).await? {
                    report.marked_unavailable.push(item.id);
                }
            } else {
                continue;
            }
            self.invalidate(item.id);
        }

        Ok(report)
    }

    async fn revert_availability(&self, item_id: ItemId, available: bool) {
        if let Err(e) = self.items.set_available(item_id, available).await {
            error!(
                "Failed to restore availability of item {} to {}: {}",
                item_id, available, e
            );
        }
    }

    fn invalidate(&self, item_id: ItemId) {
        if let Some(cache) = &self.item_cache {
            cache.invalidate(&item_id);
        }
    }
}
