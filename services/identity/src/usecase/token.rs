use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use subtle::ConstantTimeEq;
use tracing::warn;
use uuid::Uuid;

use passage_auth_types::{KeyProvider, TokenClaims, TokenPurpose};

use crate::domain::keys::token_key;
use crate::domain::repository::CredentialStore;
use crate::domain::types::{IssuedTokens, TokenPayload, TokenSettings};
use crate::error::IdentityError;

const PURPOSES: [TokenPurpose; 2] = [TokenPurpose::Access, TokenPurpose::Refresh];

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Issues and validates token pairs. The credential store holds the single live
/// token per (account, purpose); a token that verifies but is not the stored one
/// has been superseded and is rejected.
pub struct TokenService<S>
where
    S: CredentialStore,
{
    pub store: S,
    pub keys: Arc<KeyProvider>,
    pub settings: TokenSettings,
}

impl<S> TokenService<S>
where
    S: CredentialStore,
{
    /// Sign a fresh access/refresh pair and record it as the only live pair.
    ///
    /// Concurrent issuance for one account is last-writer-wins at the store.
    pub async fn issue(&self, payload: &TokenPayload) -> Result<IssuedTokens, IdentityError> {
        for purpose in PURPOSES {
            let key = token_key(payload.account_id, purpose);
            if let Err(e) = self.store.take_and_delete(&key).await {
                warn!(
                    error = %e,
                    account_id = %payload.account_id,
                    %purpose,
                    "failed to drop previous token"
                );
            }
        }

        let now = now_secs();
        let access_expires_at = now + self.settings.access_ttl.as_secs();
        let refresh_expires_at = now + self.settings.refresh_ttl.as_secs();

        let access_token = self.sign(payload, TokenPurpose::Access, now, access_expires_at)?;
        let refresh_token = self.sign(payload, TokenPurpose::Refresh, now, refresh_expires_at)?;

        self.store
            .put(
                &token_key(payload.account_id, TokenPurpose::Access),
                &access_token,
                self.settings.access_ttl,
            )
            .await?;
        self.store
            .put(
                &token_key(payload.account_id, TokenPurpose::Refresh),
                &refresh_token,
                self.settings.refresh_ttl,
            )
            .await?;

        Ok(IssuedTokens {
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at,
        })
    }

    /// Accept `token` only if it is the one currently recorded for `account_id`.
    ///
    /// Store failures surface as `Internal`, never as `InvalidToken`.
    pub async fn validate(
        &self,
        account_id: Uuid,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<(), IdentityError> {
        let stored = self.store.get(&token_key(account_id, purpose)).await?;
        match stored {
            Some(current) if bool::from(current.as_bytes().ct_eq(token.as_bytes())) => Ok(()),
            _ => Err(IdentityError::InvalidToken),
        }
    }

    /// Drop both live tokens for an account.
    pub async fn revoke(&self, account_id: Uuid) -> Result<(), IdentityError> {
        for purpose in PURPOSES {
            self.store
                .take_and_delete(&token_key(account_id, purpose))
                .await?;
        }
        Ok(())
    }

    fn sign(
        &self,
        payload: &TokenPayload,
        purpose: TokenPurpose,
        iat: u64,
        exp: u64,
    ) -> Result<String, IdentityError> {
        let claims = TokenClaims {
            iss: self.keys.issuer().to_owned(),
            aud: self.keys.audience().to_owned(),
            sub: payload.account_id.to_string(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
            email: payload.email.clone(),
            role: payload.role.as_str().to_owned(),
            profile_id: payload.profile_id.to_string(),
            profile_ids: payload.profile_ids.iter().map(Uuid::to_string).collect(),
            scope: payload.scope.clone(),
        };
        let token = self
            .keys
            .sign(&claims, purpose)
            .with_context(|| format!("sign {purpose} token"))?;
        Ok(token)
    }
}
