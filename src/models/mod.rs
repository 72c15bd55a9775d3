//! Data models for the loan ledger

pub mod item;
pub mod loan;
pub mod member;

// Re-export commonly used types
pub use item::{CreateItem, Item, ItemDetails, ItemId, UpdateItem};
pub use loan::{BorrowingRecord, EntityKind, EntityRef, LoanReceipt, LoanRecordView, RecordId};
pub use member::{CreateMember, Member, MemberDetails, MemberId, UpdateMember};
