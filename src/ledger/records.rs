//! In-memory index of borrowing records, owned by the ledger.
//!
//! Holds every record plus two indexes over the open ones. At most one open
//! record exists per item; `insert` refuses to break that.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::models::{BorrowingRecord, ItemId, MemberId, RecordId};

#[derive(Default)]
struct Index {
    records: HashMap<RecordId, BorrowingRecord>,
    open_by_item: HashMap<ItemId, RecordId>,
    open_by_member: HashMap<MemberId, BTreeSet<RecordId>>,
}

impl Index {
    fn open_for_item(&self, item_id: ItemId) -> Option<&BorrowingRecord> {
        self.open_by_item
            .get(&item_id)
            .and_then(|id| self.records.get(id))
    }

    fn link_open(&mut self, record: &BorrowingRecord) {
        self.open_by_item.insert(record.item_id(), record.id());
        self.open_by_member
            .entry(record.member_id())
            .or_default()
            .insert(record.id());
    }

    fn unlink_open(&mut self, record: &BorrowingRecord) {
        self.open_by_item.remove(&record.item_id());
        if let Some(open) = self.open_by_member.get_mut(&record.member_id()) {
            open.remove(&record.id());
            if open.is_empty() {
                self.open_by_member.remove(&record.member_id());
            }
        }
    }
}

/// Result of loading persisted records
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreSummary {
    pub loaded: usize,
    pub open: usize,
    /// Open records dropped because the item already had an earlier open loan
    pub conflicting: Vec<RecordId>,
}

#[derive(Default)]
pub struct RecordBook {
    index: RwLock<Index>,
}

impl RecordBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Index> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a freshly opened record. Returns `false`, leaving the book
    /// unchanged, if the item already has an open record.
    pub fn insert(&self, record: BorrowingRecord) -> bool {
        let mut index = self.write();
        if record.is_open() {
            if index.open_by_item.contains_key(&record.item_id()) {
                return false;
            }
            index.link_open(&record);
        }
        index.records.insert(record.id(), record);
        true
    }

    /// Close an open record. Returns the closed record, or `None` when it is
    /// unknown or already closed.
    pub fn close(&self, record_id: RecordId, at: DateTime<Utc>) -> Option<BorrowingRecord> {
        let mut index = self.write();
        let record = index.records.get_mut(&record_id)?;
        if !record.close(at) {
            return None;
        }
        let closed = record.clone();
        index.unlink_open(&closed);
        Some(closed)
    }

    pub fn open_for_item(&self, item_id: ItemId) -> Option<BorrowingRecord> {
        self.read().open_for_item(item_id).cloned()
    }

    pub fn open_for_pair(&self, item_id: ItemId, member_id: MemberId) -> Option<BorrowingRecord> {
        self.read()
            .open_for_item(item_id)
            .filter(|r| r.member_id() == member_id)
            .cloned()
    }

    pub fn has_open_for_item(&self, item_id: ItemId) -> bool {
        self.read().open_by_item.contains_key(&item_id)
    }

    pub fn has_open_for_member(&self, member_id: MemberId) -> bool {
        self.read().open_by_member.contains_key(&member_id)
    }

    pub fn open_for_member(&self, member_id: MemberId) -> Vec<BorrowingRecord> {
        let index = self.read();
        let mut open: Vec<_> = index
            .open_by_member
            .get(&member_id)
            .into_iter()
            .flatten()
            .filter_map(|id| index.records.get(id).cloned())
            .collect();
        open.sort_by_key(|r| r.borrowed_at());
        open
    }

    pub fn history_for_item(&self, item_id: ItemId) -> Vec<BorrowingRecord> {
        self.history(|r| r.item_id() == item_id)
    }

    pub fn history_for_member(&self, member_id: MemberId) -> Vec<BorrowingRecord> {
        self.history(|r| r.member_id() == member_id)
    }

    fn history(&self, keep: impl Fn(&BorrowingRecord) -> bool) -> Vec<BorrowingRecord> {
        let mut records: Vec<_> = self
            .read()
            .records
            .values()
            .filter(|r| keep(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.borrowed_at());
        records
    }

    pub fn open_count(&self) -> usize {
        self.read().open_by_item.len()
    }

    /// Replace the book's contents with persisted records. When several open
    /// records name the same item, the earliest stays open and the rest are
    /// reported as conflicting and left out.
    pub fn restore(&self, mut records: Vec<BorrowingRecord>) -> RestoreSummary {
        records.sort_by_key(|r| r.borrowed_at());

        let mut fresh = Index::default();
        let mut summary = RestoreSummary::default();
        for record in records {
            if record.is_open() {
                if fresh.open_by_item.contains_key(&record.item_id()) {
                    summary.conflicting.push(record.id());
                    continue;
                }
                fresh.link_open(&record);
                summary.open += 1;
            }
            fresh.records.insert(record.id(), record);
            summary.loaded += 1;
        }

        *self.write() = fresh;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_one_open_record_per_item() {
        let book = RecordBook::new();
        let now = Utc::now();

        assert!(book.insert(BorrowingRecord::open(1, 10, now)));
        assert!(!book.insert(BorrowingRecord::open(1, 11, now)));
        assert!(book.insert(BorrowingRecord::open(2, 10, now)));

        assert_eq!(book.open_count(), 2);
        assert_eq!(book.open_for_member(10).len(), 2);
        assert!(book.open_for_pair(1, 10).is_some());
        assert!(book.open_for_pair(1, 11).is_none());
    }

    #[test]
    fn test_close_updates_indexes() {
        let book = RecordBook::new();
        let now = Utc::now();
        let record = BorrowingRecord::open(1, 10, now);
        let id = record.id();
        book.insert(record);

        let closed = book.close(id, now + Duration::minutes(1)).unwrap();
        assert!(!closed.is_open());
        assert!(!book.has_open_for_item(1));
        assert!(!book.has_open_for_member(10));
        assert!(book.close(id, now + Duration::minutes(2)).is_none());

        // Closed records stay in the history
        let history = book.history_for_item(1);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].returned_at(), Some(now + Duration::minutes(1)));

        // The item can be lent again
        assert!(book.insert(BorrowingRecord::open(1, 11, now + Duration::minutes(3))));
        assert_eq!(book.history_for_item(1).len(), 2);
    }

    #[test]
    fn test_restore_keeps_earliest_open_record() {
        let book = RecordBook::new();
        let now = Utc::now();
        let earlier = BorrowingRecord::open(5, 1, now - Duration::hours(2));
        let later = BorrowingRecord::open(5, 2, now - Duration::hours(1));
        let mut returned = BorrowingRecord::open(6, 1, now - Duration::days(3));
        returned.close(now - Duration::days(2));

        let summary = book.restore(vec![later.clone(), returned, earlier.clone()]);

        assert_eq!(summary.loaded, 2);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.conflicting, vec![later.id()]);
        assert_eq!(book.open_for_item(5), Some(earlier));
        assert_eq!(book.history_for_member(1).len(), 2);
    }
}
