//! Authorization gate for protected endpoints.
//!
//! Three sequential checks, short-circuiting on the first failure:
//! signature and key id, store-backed token match, account existence.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use passage_auth_types::bearer::BearerToken;
use passage_auth_types::{KeyProvider, TokenClaims, TokenPurpose};

use crate::domain::repository::{AccountRepository, CredentialStore};
use crate::error::IdentityError;
use crate::state::AppState;
use crate::usecase::token::TokenService;

/// Caller identity established by the gate.
#[derive(Debug, Clone)]
pub struct Identity {
    pub account_id: Uuid,
    pub claims: TokenClaims,
}

fn rejected(purpose: TokenPurpose) -> IdentityError {
    match purpose {
        TokenPurpose::Access => IdentityError::InvalidAccessToken,
        TokenPurpose::Refresh => IdentityError::InvalidRefreshToken,
    }
}

pub struct AuthGate<A, S>
where
    A: AccountRepository,
    S: CredentialStore,
{
    pub keys: Arc<KeyProvider>,
    pub tokens: TokenService<S>,
    pub accounts: A,
}

impl<A, S> AuthGate<A, S>
where
    A: AccountRepository,
    S: CredentialStore,
{
    pub async fn authorize(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Identity, IdentityError> {
        let claims = self
            .keys
            .verify(token, purpose)
            .map_err(|_| rejected(purpose))?;
        let account_id = claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| rejected(purpose))?;

        match self.tokens.validate(account_id, token, purpose).await {
            Ok(()) => {}
            Err(IdentityError::InvalidToken) => return Err(rejected(purpose)),
            Err(e) => return Err(e),
        }

        if !self.accounts.exists(account_id).await? {
            return Err(IdentityError::DontHaveAccessToResource);
        }

        Ok(Identity { account_id, claims })
    }
}

/// Identity behind a valid access token.
#[derive(Debug, Clone)]
pub struct AccessIdentity(pub Identity);

/// Identity behind a valid refresh token.
#[derive(Debug, Clone)]
pub struct RefreshIdentity(pub Identity);

// Extract synchronously and return a 'static async block (axum-core 0.5 expects
// `fn -> impl Future + Send`).
impl FromRequestParts<AppState> for AccessIdentity {
    type Rejection = IdentityError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = BearerToken::from_headers(&parts.headers);
        let gate = state.auth_gate();
        async move {
            let BearerToken(token) = token.ok_or(IdentityError::InvalidAccessToken)?;
            gate.authorize(&token, TokenPurpose::Access).await.map(Self)
        }
    }
}

impl FromRequestParts<AppState> for RefreshIdentity {
    type Rejection = IdentityError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = BearerToken::from_headers(&parts.headers);
        let gate = state.auth_gate();
        async move {
            let BearerToken(token) = token.ok_or(IdentityError::InvalidRefreshToken)?;
            gate.authorize(&token, TokenPurpose::Refresh).await.map(Self)
        }
    }
}
