use std::sync::Arc;

use uuid::Uuid;

use passage_domain::permission::PermissionTable;
use passage_domain::profile::filter_profiles;

use crate::domain::repository::{AccountRepository, CredentialStore, ProfileRepository};
use crate::domain::types::{AuthOutput, TokenPayload};
use crate::error::IdentityError;
use crate::usecase::token::TokenService;

pub struct RefreshTokensInput {
    pub account_id: Uuid,
    /// Profile to switch to; `None` re-derives the main profile.
    pub profile_id: Option<Uuid>,
}

pub struct RefreshTokensUseCase<A, P, S>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
{
    pub accounts: A,
    pub profiles: P,
    pub tokens: TokenService<S>,
    pub permissions: Arc<PermissionTable>,
}

impl<A, P, S> RefreshTokensUseCase<A, P, S>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
{
    pub async fn execute(&self, input: RefreshTokensInput) -> Result<AuthOutput, IdentityError> {
        let account = self
            .accounts
            .find_by_id(input.account_id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        let profiles = self.profiles.list_by_account(account.id).await?;

        let (active, siblings) = match input.profile_id {
            Some(target) => {
                let active = profiles
                    .iter()
                    .find(|p| p.id == target)
                    .cloned()
                    .ok_or(IdentityError::ProfileDoesNotBelongToUser)?;
                let siblings: Vec<_> = profiles.into_iter().filter(|p| p.id != target).collect();
                (active, siblings)
            }
            None => {
                if profiles.is_empty() {
                    return Err(IdentityError::ProfilesNotFound);
                }
                let (main, subs) = filter_profiles(&profiles);
                (main.ok_or(IdentityError::ProfileNotFound)?, subs)
            }
        };

        let scope = self.permissions.scope_for(&account);
        let tokens = self
            .tokens
            .issue(&TokenPayload {
                account_id: account.id,
                email: account.email.clone(),
                profile_id: active.id,
                profile_ids: siblings.iter().map(|p| p.id).collect(),
                role: account.role,
                scope: scope.clone(),
            })
            .await?;

        Ok(AuthOutput::bearer(tokens, scope))
    }
}
