//! Key-expiry notifications from Redis, used to reap unconfirmed profiles.

use std::time::Duration;

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::repository::ExpiryHandler;
use crate::error::IdentityError;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Subscribes to `__keyevent@<db>__:expired` and forwards every expired key.
pub struct KeyExpiryListener {
    pub pool: Pool,
    pub redis_url: String,
    pub db: u8,
}

impl KeyExpiryListener {
    pub fn channel(&self) -> String {
        format!("__keyevent@{}__:expired", self.db)
    }

    /// Turn on expired-key events. Managed Redis may forbid CONFIG; the server's own
    /// setting is then used as-is.
    async fn enable_notifications(&self) -> Result<(), IdentityError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| IdentityError::Internal(e.into()))?;
        let (): () = redis::cmd("CONFIG")
            .arg("SET")
            .arg("notify-keyspace-events")
            .arg("Ex")
            .query_async(&mut conn)
            .await
            .context("enable keyspace notifications")?;
        Ok(())
    }

    /// Listen until `cancel` fires, reconnecting when the subscription drops.
    /// Handler failures are logged and never stop the loop.
    pub async fn run<H>(self, handler: H, cancel: CancellationToken)
    where
        H: ExpiryHandler,
    {
        if let Err(e) = self.enable_notifications().await {
            warn!(error = ?e, "could not enable keyspace notifications");
        }

        let channel = self.channel();
        info!(%channel, "key expiry listener started");

        while !cancel.is_cancelled() {
            if let Err(e) = self.listen(&channel, &handler, &cancel).await {
                error!(error = ?e, %channel, "expiry subscription failed");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }

        info!(%channel, "key expiry listener stopped");
    }

    async fn listen<H>(
        &self,
        channel: &str,
        handler: &H,
        cancel: &CancellationToken,
    ) -> Result<(), IdentityError>
    where
        H: ExpiryHandler,
    {
        let client = redis::Client::open(self.redis_url.as_str()).context("open redis client")?;
        let mut pubsub = client
            .get_async_pubsub()
            .await
            .context("connect pubsub")?;
        pubsub
            .subscribe(channel)
            .await
            .with_context(|| format!("subscribe {channel}"))?;

        let mut messages = pubsub.on_message();
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                message = messages.next() => message,
            };
            let Some(message) = message else {
                return Err(IdentityError::Internal(anyhow::anyhow!(
                    "pubsub stream closed"
                )));
            };

            let key: String = match message.get_payload() {
                Ok(key) => key,
                Err(e) => {
                    warn!(error = %e, "unreadable expiry payload");
                    continue;
                }
            };
            debug!(%key, "key expired");
            if let Err(e) = handler.on_key_expired(&key).await {
                warn!(error = ?e, %key, "expiry compensation failed");
            }
        }
    }
}
