#![allow(async_fn_in_trait)]

use std::time::Duration;

use anyhow::Context as _;
use uuid::Uuid;

use passage_domain::account::Account;
use passage_domain::chat::MemberChat;
use passage_domain::profile::{GrantType, Profile};
use passage_events::envelope::AUTH_SOURCE;
use passage_events::{DomainEvent, EventEnvelope, Topic};

use crate::domain::types::{PasswordDigest, RemovedProfile};
use crate::error::IdentityError;

/// TTL key-value store holding live tokens, reset codes and pending-profile markers.
///
/// Same-key operations are linearizable; nothing is promised across keys.
pub trait CredentialStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), IdentityError>;

    async fn get(&self, key: &str) -> Result<Option<String>, IdentityError>;

    /// Atomic read + delete. `None` when the key was absent (or already taken).
    async fn take_and_delete(&self, key: &str) -> Result<Option<String>, IdentityError>;

    fn close(&self);
}

/// Repository for accounts. Reads only see `active` rows.
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, IdentityError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, IdentityError>;

    async fn exists_with_email(&self, email: &str) -> Result<bool, IdentityError>;

    async fn exists(&self, id: Uuid) -> Result<bool, IdentityError>;

    /// Flip `is_active` to true.
    async fn activate(&self, id: Uuid) -> Result<(), IdentityError>;

    async fn update_password(&self, id: Uuid, digest: &PasswordDigest)
    -> Result<(), IdentityError>;
}

/// Repository for profiles outside of a profile-creation transaction.
pub trait ProfileRepository: Send + Sync {
    async fn list_by_account(&self, account_id: Uuid) -> Result<Vec<Profile>, IdentityError>;

    /// Soft-delete a live profile. When it held `Main`, the account's oldest remaining
    /// profile becomes `Main` in the same write, so the account never loses its main.
    /// `None` when no live row was found.
    async fn soft_delete(&self, id: Uuid) -> Result<Option<RemovedProfile>, IdentityError>;
}

/// Repository for group permission rows.
pub trait MemberChatRepository: Send + Sync {
    async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<MemberChat>, IdentityError>;

    async fn create(&self, member: &MemberChat) -> Result<(), IdentityError>;
}

/// Opens a relational transaction owned by exactly one use case.
pub trait UnitOfWork: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx, IdentityError>;
}

/// Writes that must land together. Nothing is visible until [`Transaction::commit`].
pub trait Transaction: Send {
    async fn insert_account(&mut self, account: &Account) -> Result<(), IdentityError>;

    async fn find_main_profile(
        &mut self,
        account_id: Uuid,
    ) -> Result<Option<Profile>, IdentityError>;

    async fn insert_profile(&mut self, profile: &Profile) -> Result<(), IdentityError>;

    async fn set_grant_type(
        &mut self,
        profile_id: Uuid,
        grant_type: GrantType,
    ) -> Result<(), IdentityError>;

    async fn commit(self) -> Result<(), IdentityError>;

    async fn rollback(self) -> Result<(), IdentityError>;
}

/// Outbound side of the event bus.
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, envelope: &EventEnvelope, topic: Topic) -> Result<(), IdentityError>;

    /// Wrap `event` in an `auth_events` envelope and publish it.
    async fn publish_event<E>(&self, event: &E, topic: Topic) -> Result<(), IdentityError>
    where
        E: DomainEvent + Sync,
    {
        let envelope = EventEnvelope::wrap(event, AUTH_SOURCE)
            .with_context(|| format!("wrap {} event", E::EVENT_TYPE))?;
        self.publish(&envelope, topic).await
    }
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<PasswordDigest, IdentityError>;

    fn verify(&self, password: &str, digest: &PasswordDigest) -> Result<bool, IdentityError>;
}

/// Consumer-side callback for one broker message. `Internal` errors leave the message
/// pending for redelivery; any other error is logged and the message acknowledged.
pub trait InboundHandler: Send + Sync {
    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), IdentityError>;
}

/// Callback for a key-expiry notification.
pub trait ExpiryHandler: Send + Sync {
    async fn on_key_expired(&self, key: &str) -> Result<(), IdentityError>;
}
