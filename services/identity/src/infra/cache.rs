use std::time::Duration;

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;

use crate::domain::repository::CredentialStore;
use crate::error::IdentityError;

/// Credential store backed by Redis. Expiry uses native key TTLs so the expiry
/// listener sees pending-profile markers lapse.
#[derive(Clone)]
pub struct RedisCredentialStore {
    pub pool: Pool,
}

impl CredentialStore for RedisCredentialStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), IdentityError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| IdentityError::Internal(e.into()))?;
        // SETEX rejects a zero TTL.
        let seconds = ttl.as_secs().max(1);
        let (): () = conn
            .set_ex(key, value, seconds)
            .await
            .with_context(|| format!("set {key}"))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, IdentityError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| IdentityError::Internal(e.into()))?;
        let value: Option<String> = conn.get(key).await.with_context(|| format!("get {key}"))?;
        Ok(value)
    }

    async fn take_and_delete(&self, key: &str) -> Result<Option<String>, IdentityError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| IdentityError::Internal(e.into()))?;
        let value: Option<String> = conn
            .get_del(key)
            .await
            .with_context(|| format!("getdel {key}"))?;
        Ok(value)
    }

    fn close(&self) {
        self.pool.close();
    }
}
