//! Loan management service

use std::sync::Arc;

use crate::{
    error::AppResult,
    ledger::LoanLedger,
    models::{EntityRef, ItemId, LoanReceipt, LoanRecordView, MemberId},
};

#[derive(Clone)]
pub struct LoansService {
    ledger: Arc<LoanLedger>,
}

impl LoansService {
    pub fn new(ledger: Arc<LoanLedger>) -> Self {
        Self { ledger }
    }

    /// Borrow an item
    pub async fn borrow(&self, item_id: ItemId, member_id: MemberId) -> AppResult<LoanReceipt> {
        self.ledger.borrow(item_id, member_id).await
    }

    /// Return a borrowed item
    pub async fn return_item(&self, item_id: ItemId, member_id: MemberId) -> AppResult<LoanReceipt> {
        self.ledger.return_item(item_id, member_id).await
    }

    /// All loans of an item, oldest first
    pub fn item_history(&self, item_id: ItemId) -> Vec<LoanRecordView> {
        self.ledger
            .records_for_item(item_id)
            .iter()
            .map(Into::into)
            .collect()
    }

    /// All loans of a member, oldest first
    pub fn member_history(&self, member_id: MemberId) -> Vec<LoanRecordView> {
        self.ledger
            .records_for_member(member_id)
            .iter()
            .map(Into::into)
            .collect()
    }

    pub fn is_currently_borrowed(&self, item_id: ItemId) -> bool {
        self.ledger.is_currently_borrowed(item_id)
    }

    pub fn can_delete(&self, entity: EntityRef) -> bool {
        self.ledger.can_delete(entity)
    }

    /// Shared ledger, for startup hydration and diagnostics
    pub fn ledger(&self) -> &Arc<LoanLedger> {
        &self.ledger
    }
}
