use std::sync::Arc;

use uuid::Uuid;

use passage_domain::account::{Account, AccountRole};
use passage_domain::password::validate_password;
use passage_domain::permission::PermissionTable;
use passage_domain::profile::{GrantType, Profile};

use crate::domain::repository::{
    AccountRepository, CredentialStore, EventPublisher, PasswordHasher, ProfileRepository,
    Transaction, UnitOfWork,
};
use crate::domain::types::{AuthOutput, TokenPayload};
use crate::error::IdentityError;
use crate::usecase::finish;
use crate::usecase::saga::{CreateProfileInput, ProfileSaga};
use crate::usecase::token::TokenService;

pub struct SignUpInput {
    pub email: String,
    pub password: String,
    /// 0 = client, 1 = organization, 2 = admin
    pub role: u8,
}

pub struct SignUpUseCase<A, P, S, E, U, H>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    E: EventPublisher,
    U: UnitOfWork,
    H: PasswordHasher,
{
    pub accounts: A,
    pub uow: U,
    pub hasher: H,
    pub saga: ProfileSaga<A, P, S, E>,
    pub tokens: TokenService<S>,
    pub permissions: Arc<PermissionTable>,
}

impl<A, P, S, E, U, H> SignUpUseCase<A, P, S, E, U, H>
where
    A: AccountRepository,
    P: ProfileRepository,
    S: CredentialStore,
    E: EventPublisher,
    U: UnitOfWork,
    H: PasswordHasher,
{
    pub async fn execute(&self, input: SignUpInput) -> Result<AuthOutput, IdentityError> {
        if self.accounts.exists_with_email(&input.email).await? {
            return Err(IdentityError::UserAlreadyExists);
        }
        validate_password(&input.password)?;
        let role = AccountRole::from_u8(input.role).ok_or(IdentityError::RoleNotFound)?;

        let digest = self.hasher.hash(&input.password)?;
        let account = Account {
            id: Uuid::new_v4(),
            email: input.email,
            password_hash: digest.hash,
            password_salt: digest.salt,
            is_active: false,
            role,
        };

        let mut tx = self.uow.begin().await?;
        let result = self.register(&mut tx, &account).await;
        let profile = finish(tx, result).await?;

        // Tokens are only recorded once the account is committed. Inactive until
        // confirmed, so this is the anonymous scope.
        let scope = self.permissions.scope_for(&account);
        let tokens = self
            .tokens
            .issue(&TokenPayload {
                account_id: account.id,
                email: account.email.clone(),
                profile_id: profile.id,
                profile_ids: vec![],
                role: account.role,
                scope: scope.clone(),
            })
            .await?;

        Ok(AuthOutput::bearer(tokens, scope))
    }

    async fn register<T>(&self, tx: &mut T, account: &Account) -> Result<Profile, IdentityError>
    where
        T: Transaction,
    {
        tx.insert_account(account).await?;

        self.saga
            .create(
                tx,
                &CreateProfileInput {
                    account_id: account.id,
                    email: account.email.clone(),
                    role: account.role,
                    grant_type: GrantType::Main,
                },
            )
            .await
    }
}
