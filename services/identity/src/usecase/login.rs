use std::sync::Arc;

use passage_domain::password::validate_password;
use passage_domain::permission::PermissionTable;
use passage_domain::profile::filter_profiles;

use crate::domain::repository::{
    AccountRepository, CredentialStore, PasswordHasher, ProfileRepository,
};
use crate::domain::types::{AuthOutput, PasswordDigest, TokenPayload};
use crate::error::IdentityError;
use crate::usecase::token::TokenService;

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct LoginUseCase<A, P, S, H>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    H: PasswordHasher,
{
    pub accounts: A,
    pub profiles: P,
    pub hasher: H,
    pub tokens: TokenService<S>,
    pub permissions: Arc<PermissionTable>,
}

impl<A, P, S, H> LoginUseCase<A, P, S, H>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    H: PasswordHasher,
{
    /// Every rejection is `UserAuthFailed` so callers cannot tell which check failed.
    pub async fn execute(&self, input: LoginInput) -> Result<AuthOutput, IdentityError> {
        let account = self
            .accounts
            .find_by_email(&input.email)
            .await?
            .ok_or(IdentityError::UserAuthFailed)?;

        validate_password(&input.password).map_err(|_| IdentityError::UserAuthFailed)?;

        let digest = PasswordDigest {
            hash: account.password_hash.clone(),
            salt: account.password_salt.clone(),
        };
        if !self.hasher.verify(&input.password, &digest)? {
            return Err(IdentityError::UserAuthFailed);
        }

        let profiles = self.profiles.list_by_account(account.id).await?;
        let (main, subs) = filter_profiles(&profiles);
        let main = main.ok_or(IdentityError::UserAuthFailed)?;

        let scope = self.permissions.scope_for(&account);
        let tokens = self
            .tokens
            .issue(&TokenPayload {
                account_id: account.id,
                email: account.email.clone(),
                profile_id: main.id,
                profile_ids: subs.iter().map(|p| p.id).collect(),
                role: account.role,
                scope: scope.clone(),
            })
            .await?;

        Ok(AuthOutput::bearer(tokens, scope))
    }
}
