use tracing::info;
use uuid::Uuid;

use passage_domain::chat::{ChatRole, MemberChat};
use passage_events::events::{GroupCreatedEvent, InviteAcceptedEvent};

use crate::domain::repository::{AccountRepository, MemberChatRepository};
use crate::domain::types::GroupPermission;
use crate::error::IdentityError;

// ── FetchGroupPermissions ────────────────────────────────────────────────────

pub struct FetchGroupPermissionsInput {
    pub group_id: Uuid,
    pub member_id: Uuid,
}

pub struct FetchGroupPermissionsUseCase<M: MemberChatRepository> {
    pub members: M,
}

impl<M: MemberChatRepository> FetchGroupPermissionsUseCase<M> {
    pub async fn execute(
        &self,
        input: FetchGroupPermissionsInput,
    ) -> Result<GroupPermission, IdentityError> {
        let rows = self.members.list_by_group(input.group_id).await?;
        if rows.is_empty() {
            return Err(IdentityError::GroupNotFound);
        }

        let member = rows
            .into_iter()
            .find(|m| m.member_id == input.member_id)
            .ok_or(IdentityError::MemberNotFound)?;

        Ok(GroupPermission {
            member_id: member.member_id,
            role: member.role,
        })
    }
}

// ── Inbound group events ─────────────────────────────────────────────────────

/// Maintains `member_chats` rows from group lifecycle events.
pub struct GroupMembership<A, M>
where
    A: AccountRepository,
    M: MemberChatRepository,
{
    pub accounts: A,
    pub members: M,
}

impl<A, M> GroupMembership<A, M>
where
    A: AccountRepository,
    M: MemberChatRepository,
{
    /// The creator becomes the group's admin.
    pub async fn on_group_created(&self, event: &GroupCreatedEvent) -> Result<(), IdentityError> {
        if !self.members.list_by_group(event.group_id).await?.is_empty() {
            return Err(IdentityError::GroupAlreadyAssigned);
        }
        if !self.accounts.exists(event.creator_id).await? {
            return Err(IdentityError::UserNotFound);
        }

        let admin = MemberChat::new(event.group_id, event.creator_id, ChatRole::Admin);
        self.members.create(&admin).await?;
        info!(group_id = %event.group_id, member_id = %event.creator_id, "group admin assigned");
        Ok(())
    }

    pub async fn on_invite_accepted(
        &self,
        event: &InviteAcceptedEvent,
    ) -> Result<(), IdentityError> {
        let rows = self.members.list_by_group(event.group_id).await?;
        if rows.is_empty() {
            return Err(IdentityError::GroupNotFound);
        }
        if !self.accounts.exists(event.invitee_id).await? {
            return Err(IdentityError::UserNotFound);
        }
        if rows.iter().any(|m| m.member_id == event.invitee_id) {
            return Err(IdentityError::AlreadyMember);
        }

        let role = ChatRole::from_wire(event.role);
        let member = MemberChat::new(event.group_id, event.invitee_id, role);
        self.members.create(&member).await?;
        info!(
            group_id = %event.group_id,
            member_id = %event.invitee_id,
            invite_id = %event.invite_id,
            role = %role,
            "group member added"
        );
        Ok(())
    }
}
