use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use passage_domain::account::AccountRole;
use passage_domain::profile::{GrantType, Profile};
use passage_events::Topic;
use passage_events::events::{ProfileCreatedEvent, UserCreatedEvent};

use crate::domain::keys::{PENDING_MARKER, parse_pending_profile_key, pending_profile_key};
use crate::domain::repository::{
    AccountRepository, CredentialStore, EventPublisher, ExpiryHandler, ProfileRepository,
    Transaction,
};
use crate::error::IdentityError;

pub struct CreateProfileInput {
    pub account_id: Uuid,
    pub email: String,
    pub role: AccountRole,
    pub grant_type: GrantType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Activated,
    /// The pending marker was already consumed (duplicate delivery or expired).
    AlreadySettled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Not a pending-profile key.
    Ignored,
    Removed,
    AlreadyGone,
}

/// Two-phase profile creation: create + publish + pending marker, then either a
/// downstream confirmation activates the account or the marker's expiry reaps the
/// profile. Both completions race on the same one-shot marker.
pub struct ProfileSaga<A, P, S, E>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    E: EventPublisher,
{
    pub accounts: A,
    pub profiles: P,
    pub store: S,
    pub publisher: E,
    pub pending_ttl: Duration,
}

impl<A, P, S, E> ProfileSaga<A, P, S, E>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    E: EventPublisher,
{
    /// Create a profile inside the caller's transaction.
    ///
    /// A new `Main` demotes the current one in the same transaction. The marker is
    /// written before publishing so an early confirmation always finds it; a failed
    /// publish aborts the caller's transaction.
    pub async fn create<T>(
        &self,
        tx: &mut T,
        input: &CreateProfileInput,
    ) -> Result<Profile, IdentityError>
    where
        T: Transaction,
    {
        if input.grant_type == GrantType::Main {
            if let Some(current) = tx.find_main_profile(input.account_id).await? {
                tx.set_grant_type(current.id, GrantType::Sub).await?;
                debug!(profile_id = %current.id, "demoted previous main profile");
            }
        }

        let profile = Profile::new(input.account_id, input.grant_type);
        tx.insert_profile(&profile).await?;

        self.store
            .put(
                &pending_profile_key(profile.id),
                PENDING_MARKER,
                self.pending_ttl,
            )
            .await?;

        let event = UserCreatedEvent {
            auth_id: input.account_id,
            profile_id: profile.id,
            email: input.email.clone(),
            role: input.role.as_str().to_owned(),
        };
        self.publisher.publish_event(&event, Topic::AuthEvents).await?;

        info!(
            account_id = %input.account_id,
            profile_id = %profile.id,
            grant_type = ?input.grant_type,
            "profile created, awaiting confirmation"
        );
        Ok(profile)
    }

    /// Apply a downstream confirmation. Replays are a no-op.
    pub async fn confirm(
        &self,
        event: &ProfileCreatedEvent,
    ) -> Result<Confirmation, IdentityError> {
        let account = self
            .accounts
            .find_by_id(event.auth_id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        let profiles = self.profiles.list_by_account(account.id).await?;
        if !profiles.iter().any(|p| p.id == event.profile_id) {
            return Err(IdentityError::AccessRevoked);
        }

        let key = pending_profile_key(event.profile_id);
        if self.store.get(&key).await?.is_none() {
            debug!(profile_id = %event.profile_id, "confirmation already settled");
            return Ok(Confirmation::AlreadySettled);
        }

        // Inactive accounts activate on their first profile; active ones only
        // confirm additional profiles.
        let count = profiles.len();
        let allowed = (count > 1 && account.is_active) || (!account.is_active && count == 1);
        if !allowed {
            return Err(IdentityError::FaultedAccount);
        }

        if self.store.take_and_delete(&key).await?.is_none() {
            debug!(profile_id = %event.profile_id, "pending marker consumed concurrently");
            return Ok(Confirmation::AlreadySettled);
        }

        self.accounts.activate(account.id).await?;
        info!(account_id = %account.id, profile_id = %event.profile_id, "profile confirmed");
        Ok(Confirmation::Activated)
    }

    /// Compensate for a profile whose marker expired unconfirmed. An expired `Main`
    /// hands the grant back to the account's oldest remaining profile.
    pub async fn expire(&self, key: &str) -> Result<Expiry, IdentityError> {
        let Some(profile_id) = parse_pending_profile_key(key) else {
            return Ok(Expiry::Ignored);
        };

        match self.profiles.soft_delete(profile_id).await? {
            Some(removed) => {
                warn!(
                    %profile_id,
                    account_id = %removed.profile.account_id,
                    promoted = ?removed.promoted,
                    "removed profile that was never confirmed"
                );
                Ok(Expiry::Removed)
            }
            None => {
                debug!(%profile_id, "expired profile already gone");
                Ok(Expiry::AlreadyGone)
            }
        }
    }
}

impl<A, P, S, E> ExpiryHandler for ProfileSaga<A, P, S, E>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    E: EventPublisher,
{
    async fn on_key_expired(&self, key: &str) -> Result<(), IdentityError> {
        self.expire(key).await.map(|_| ())
    }
}
