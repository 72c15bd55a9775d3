//! Borrowing records and loan results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::item::ItemId;
use super::member::MemberId;

pub type RecordId = Uuid;

/// A loan of one item to one member.
///
/// `item_id`, `member_id` and `borrowed_at` are fixed at creation. The only
/// permitted mutation is closing the record, which happens at most once.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BorrowingRecord {
    id: RecordId,
    item_id: ItemId,
    member_id: MemberId,
    borrowed_at: DateTime<Utc>,
    returned_at: Option<DateTime<Utc>>,
}

impl BorrowingRecord {
    /// Open a new loan
    pub fn open(item_id: ItemId, member_id: MemberId, borrowed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            member_id,
            borrowed_at,
            returned_at: None,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn borrowed_at(&self) -> DateTime<Utc> {
        self.borrowed_at
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Copy of this record closed at `at`, or `None` if already closed
    pub fn closed(&self, at: DateTime<Utc>) -> Option<Self> {
        if !self.is_open() {
            return None;
        }
        Some(Self {
            returned_at: Some(at),
            ..self.clone()
        })
    }

    pub(crate) fn close(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_open() {
            self.returned_at = Some(at);
            true
        } else {
            false
        }
    }
}

/// Confirmation of a successful borrow or return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanReceipt {
    pub item_id: ItemId,
    pub member_id: MemberId,
    pub record_id: RecordId,
    pub at: DateTime<Utc>,
}

/// Reference to an entity that loans can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Item(ItemId),
    Member(MemberId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Item,
    Member,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        match kind {
            EntityKind::Item => EntityRef::Item(id),
            EntityKind::Member => EntityRef::Member(id),
        }
    }
}

/// Borrowing record as shown to API clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanRecordView {
    pub id: RecordId,
    pub item_id: ItemId,
    pub member_id: MemberId,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub open: bool,
}

impl From<&BorrowingRecord> for LoanRecordView {
    fn from(record: &BorrowingRecord) -> Self {
        Self {
            id: record.id,
            item_id: record.item_id,
            member_id: record.member_id,
            borrowed_at: record.borrowed_at,
            returned_at: record.returned_at,
            open: record.is_open(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_only_once() {
        let now = Utc::now();
        let mut record = BorrowingRecord::open(1, 2, now);
        assert!(record.is_open());

        assert!(record.close(now));
        assert!(!record.is_open());
        assert_eq!(record.returned_at(), Some(now));

        let later = now + chrono::Duration::seconds(5);
        assert!(!record.close(later));
        assert_eq!(record.returned_at(), Some(now));
        assert!(record.closed(later).is_none());
    }
}
