use anyhow::anyhow;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher as _, SaltString};
use subtle::ConstantTimeEq;

use crate::domain::repository::PasswordHasher;
use crate::domain::types::PasswordDigest;
use crate::error::IdentityError;

/// Argon2id with a random per-account salt, stored next to the PHC hash string.
#[derive(Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    fn hash_with(password: &str, salt: &SaltString) -> Result<String, IdentityError> {
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), salt)
            .map_err(|e| IdentityError::Internal(anyhow!("hash password: {e}")))?;
        Ok(hash.to_string())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<PasswordDigest, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::hash_with(password, &salt)?;
        Ok(PasswordDigest {
            hash,
            salt: salt.as_str().to_owned(),
        })
    }

    fn verify(&self, password: &str, digest: &PasswordDigest) -> Result<bool, IdentityError> {
        let salt = SaltString::from_b64(&digest.salt)
            .map_err(|e| IdentityError::Internal(anyhow!("stored salt is invalid: {e}")))?;
        let candidate = Self::hash_with(password, &salt)?;
        Ok(candidate.as_bytes().ct_eq(digest.hash.as_bytes()).into())
    }
}
