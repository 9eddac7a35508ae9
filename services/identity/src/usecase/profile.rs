use std::sync::Arc;

use uuid::Uuid;

use passage_domain::permission::PermissionTable;
use passage_domain::profile::GrantType;

use crate::domain::repository::{
    AccountRepository, CredentialStore, EventPublisher, ProfileRepository, UnitOfWork,
};
use crate::domain::types::{AuthOutput, TokenPayload};
use crate::error::IdentityError;
use crate::usecase::saga::{CreateProfileInput, ProfileSaga};
use crate::usecase::token::TokenService;
use crate::usecase::{finish, scope_strings};

pub struct AttachProfileInput {
    pub account_id: Uuid,
    /// 0 = main, 1 = sub
    pub grant_type: u8,
}

pub struct AttachProfileUseCase<A, P, S, E, U>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    E: EventPublisher,
    U: UnitOfWork,
{
    pub accounts: A,
    pub profiles: P,
    pub uow: U,
    pub saga: ProfileSaga<A, P, S, E>,
    pub tokens: TokenService<S>,
    pub permissions: Arc<PermissionTable>,
}

impl<A, P, S, E, U> AttachProfileUseCase<A, P, S, E, U>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    E: EventPublisher,
    U: UnitOfWork,
{
    pub async fn execute(&self, input: AttachProfileInput) -> Result<AuthOutput, IdentityError> {
        let grant_type =
            GrantType::from_u8(input.grant_type).ok_or(IdentityError::GrantTypeNotFound)?;

        let account = self
            .accounts
            .find_by_id(input.account_id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;
        let existing = self.profiles.list_by_account(account.id).await?;

        let mut tx = self.uow.begin().await?;
        let result = self
            .saga
            .create(
                &mut tx,
                &CreateProfileInput {
                    account_id: account.id,
                    email: account.email.clone(),
                    role: account.role,
                    grant_type,
                },
            )
            .await;
        let profile = finish(tx, result).await?;

        // The new profile is pending until confirmed.
        let scope = scope_strings(self.permissions.resolve(account.role, false));
        let tokens = self
            .tokens
            .issue(&TokenPayload {
                account_id: account.id,
                email: account.email.clone(),
                profile_id: profile.id,
                profile_ids: existing.iter().map(|p| p.id).collect(),
                role: account.role,
                scope: scope.clone(),
            })
            .await?;

        Ok(AuthOutput::bearer(tokens, scope))
    }
}
