//! Inbound event dispatch.

use tracing::{debug, warn};

use passage_events::events::{GroupCreatedEvent, InviteAcceptedEvent, ProfileCreatedEvent};
use passage_events::{EventEnvelope, EventError, EventRegistry};

use crate::domain::repository::{
    AccountRepository, CredentialStore, EventPublisher, InboundHandler, MemberChatRepository,
    ProfileRepository,
};
use crate::error::IdentityError;
use crate::usecase::group::GroupMembership;
use crate::usecase::saga::ProfileSaga;

/// Every event this service consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    ProfileCreated(ProfileCreatedEvent),
    GroupCreated(GroupCreatedEvent),
    InviteAccepted(InviteAcceptedEvent),
}

pub fn inbound_registry() -> EventRegistry<InboundEvent> {
    EventRegistry::new()
        .register(InboundEvent::ProfileCreated)
        .register(InboundEvent::GroupCreated)
        .register(InboundEvent::InviteAccepted)
}

pub struct EventDispatcher<A, P, S, E, M>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    E: EventPublisher,
    M: MemberChatRepository,
{
    pub registry: EventRegistry<InboundEvent>,
    pub saga: ProfileSaga<A, P, S, E>,
    pub groups: GroupMembership<A, M>,
}

impl<A, P, S, E, M> InboundHandler for EventDispatcher<A, P, S, E, M>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    E: EventPublisher,
    M: MemberChatRepository,
{
    /// Unknown tags and undecodable payloads are skipped; redelivering them
    /// cannot succeed.
    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), IdentityError> {
        let event = match self.registry.decode(envelope) {
            Ok(event) => event,
            Err(EventError::UnknownEventType(event_type)) => {
                debug!(%event_type, key = %envelope.key, "skipping unhandled event");
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, event_type = %envelope.event_type, key = %envelope.key, "dropping undecodable event");
                return Ok(());
            }
        };

        match event {
            InboundEvent::ProfileCreated(event) => {
                let outcome = self.saga.confirm(&event).await?;
                debug!(profile_id = %event.profile_id, ?outcome, "profile confirmation handled");
            }
            InboundEvent::GroupCreated(event) => self.groups.on_group_created(&event).await?,
            InboundEvent::InviteAccepted(event) => self.groups.on_invite_accepted(&event).await?,
        }
        Ok(())
    }
}
