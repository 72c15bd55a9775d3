//! Member management service

use std::sync::Arc;

use validator::Validate;

use crate::{
    cache::EntityCache,
    error::{AppError, AppResult, NotFoundKind},
    ledger::LoanLedger,
    models::{CreateMember, EntityRef, Member, MemberDetails, MemberId, UpdateMember},
    repository::MemberDirectory,
};

#[derive(Clone)]
pub struct MembersService {
    members: Arc<dyn MemberDirectory>,
    ledger: Arc<LoanLedger>,
    cache: Arc<EntityCache<MemberId, Member>>,
}

impl MembersService {
    pub fn new(
        members: Arc<dyn MemberDirectory>,
        ledger: Arc<LoanLedger>,
        cache: Arc<EntityCache<MemberId, Member>>,
    ) -> Self {
        Self { members, ledger, cache }
    }

    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        self.cache.list_or_load(|| self.members.list()).await
    }

    pub async fn get_member(&self, id: MemberId) -> AppResult<Member> {
        self.cache
            .get_or_load(&id, || self.members.get(id))
            .await?
            .ok_or_else(|| AppError::not_found(NotFoundKind::Member, id))
    }

    /// Get member with the loans they currently hold
    pub async fn get_member_details(&self, id: MemberId) -> AppResult<MemberDetails> {
        let member = self.get_member(id).await?;
        let open_loans = self
            .ledger
            .open_loans_for_member(id)
            .iter()
            .map(Into::into)
            .collect();
        Ok(MemberDetails { member, open_loans })
    }

    pub async fn create_member(&self, request: CreateMember) -> AppResult<Member> {
        request.validate()?;
        let member = self.members.create(&request).await?;
        self.cache.invalidate_listing();
        tracing::info!("Created member id={}", member.id);
        Ok(member)
    }

    pub async fn update_member(&self, id: MemberId, changes: UpdateMember) -> AppResult<Member> {
        changes.validate()?;
        let updated = self
            .members
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::not_found(NotFoundKind::Member, id))?;
        self.cache.invalidate(&id);
        Ok(updated)
    }

    /// Delete a member holding no open loan
    pub async fn delete_member(&self, id: MemberId) -> AppResult<()> {
        self.ledger
            .remove_guarded(EntityRef::Member(id), || self.members.remove(id))
            .await?;
        self.cache.invalidate(&id);
        tracing::info!("Deleted member id={}", id);
        Ok(())
    }
}
