//! Credential store key layout.

use uuid::Uuid;

use passage_auth_types::TokenPurpose;

pub const PENDING_PROFILE_PREFIX: &str = "profile:pending";

/// Value written under a pending-profile key; only its presence matters.
pub const PENDING_MARKER: &str = "1";

/// `{account_id}:access` / `{account_id}:refresh`
pub fn token_key(account_id: Uuid, purpose: TokenPurpose) -> String {
    format!("{account_id}:{}", purpose.as_str())
}

/// `{account_id}:forgot`
pub fn forgot_key(account_id: Uuid) -> String {
    format!("{account_id}:forgot")
}

/// `profile:pending:{profile_id}`
pub fn pending_profile_key(profile_id: Uuid) -> String {
    format!("{PENDING_PROFILE_PREFIX}:{profile_id}")
}

/// Profile id from an expired key, or `None` when the key is not a pending marker.
pub fn parse_pending_profile_key(key: &str) -> Option<Uuid> {
    key.strip_prefix(PENDING_PROFILE_PREFIX)?
        .strip_prefix(':')?
        .parse()
        .ok()
}
