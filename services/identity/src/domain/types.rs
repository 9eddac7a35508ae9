use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use passage_domain::account::AccountRole;
use passage_domain::chat::ChatRole;
use passage_domain::profile::Profile;

/// Token lifetimes, converted once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Everything a token pair is signed over.
#[derive(Debug, Clone)]
pub struct TokenPayload {
    pub account_id: Uuid,
    pub email: String,
    pub profile_id: Uuid,
    pub profile_ids: Vec<Uuid>,
    pub role: AccountRole,
    pub scope: Vec<String>,
}

/// A freshly signed access/refresh pair; expiries are unix seconds.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub access_expires_at: u64,
    pub refresh_token: String,
    pub refresh_expires_at: u64,
}

/// Response body shared by every token-issuing use case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutput {
    pub token_type: String,
    pub access_token: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub refresh_expires_in: u64,
    pub scope: Vec<String>,
}

impl AuthOutput {
    pub fn bearer(tokens: IssuedTokens, scope: Vec<String>) -> Self {
        Self {
            token_type: "Bearer".to_owned(),
            access_token: tokens.access_token,
            expires_in: tokens.access_expires_at,
            refresh_token: tokens.refresh_token,
            refresh_expires_in: tokens.refresh_expires_at,
            scope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Output of a password hash: the encoded hash and the salt it was derived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub hash: String,
    pub salt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldAvailability {
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupPermission {
    pub member_id: Uuid,
    pub role: ChatRole,
}

/// A soft-deleted profile and, when it held `Main`, the profile promoted in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedProfile {
    pub profile: Profile,
    pub promoted: Option<Uuid>,
}
