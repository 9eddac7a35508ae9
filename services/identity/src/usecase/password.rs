use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rand::RngExt;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::info;
use uuid::Uuid;

use passage_domain::password::validate_password;
use passage_events::Topic;
use passage_events::events::EmailQueueEvent;

use crate::domain::keys::forgot_key;
use crate::domain::repository::{AccountRepository, CredentialStore, EventPublisher, PasswordHasher};
use crate::domain::types::Message;
use crate::error::IdentityError;
use crate::usecase::token::TokenService;

pub const FORGOT_PASSWORD_TEMPLATE: &str = "forgot-password";

const FORGOT_MESSAGE: &str =
    "It was sent an email with the code to renew your password to your email";
const RESET_MESSAGE: &str = "The password was changed with success.";

fn generate_code() -> String {
    let mut rng = rand::rng();
    let code: u32 = rng.random_range(0..1_000_000);
    format!("{code:06}")
}

/// Only the digest of a reset code is ever stored.
fn digest_code(code: &str) -> String {
    format!("{:x}", Sha256::digest(code.as_bytes()))
}

// ── ForgotPassword ───────────────────────────────────────────────────────────

pub struct ForgotPasswordInput {
    pub email: String,
}

pub struct ForgotPasswordUseCase<A, S, E>
where
    A: AccountRepository,
    S: CredentialStore,
    E: EventPublisher,
{
    pub accounts: A,
    pub store: S,
    pub publisher: E,
    pub code_ttl: Duration,
}

impl<A, S, E> ForgotPasswordUseCase<A, S, E>
where
    A: AccountRepository,
    S: CredentialStore,
    E: EventPublisher,
{
    pub async fn execute(&self, input: ForgotPasswordInput) -> Result<Message, IdentityError> {
        let account = self
            .accounts
            .find_by_email(&input.email)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        // A new code replaces any code still pending for this account.
        let code = generate_code();
        self.store
            .put(&forgot_key(account.id), &digest_code(&code), self.code_ttl)
            .await?;

        let event = EmailQueueEvent {
            id: Uuid::new_v4(),
            recipient: account.email,
            template: FORGOT_PASSWORD_TEMPLATE.to_owned(),
            variables: HashMap::from([("code".to_owned(), code)]),
            send_at: Utc::now(),
        };
        self.publisher
            .publish_event(&event, Topic::MessagingEventsEmail)
            .await?;

        info!(account_id = %account.id, "password reset code issued");
        Ok(Message::new(FORGOT_MESSAGE))
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordInput {
    pub email: String,
    pub code: String,
    pub password: String,
}

pub struct ResetPasswordUseCase<A, S, H>
where
    A: AccountRepository,
    S: CredentialStore,
    H: PasswordHasher,
{
    pub accounts: A,
    pub store: S,
    pub hasher: H,
    pub tokens: TokenService<S>,
}

impl<A, S, H> ResetPasswordUseCase<A, S, H>
where
    A: AccountRepository,
    S: CredentialStore,
    H: PasswordHasher,
{
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<Message, IdentityError> {
        let account = self
            .accounts
            .find_by_email(&input.email)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        // Checked first so a weak password does not burn the code.
        validate_password(&input.password)?;

        let stored = self.store.take_and_delete(&forgot_key(account.id)).await?;
        let presented = digest_code(&input.code);
        let matches = stored
            .map(|s| bool::from(s.as_bytes().ct_eq(presented.as_bytes())))
            .unwrap_or(false);
        if !matches {
            return Err(IdentityError::CodeNotValid);
        }

        let digest = self.hasher.hash(&input.password)?;
        self.accounts.update_password(account.id, &digest).await?;
        self.tokens.revoke(account.id).await?;

        info!(account_id = %account.id, "password reset");
        Ok(Message::new(RESET_MESSAGE))
    }
}
