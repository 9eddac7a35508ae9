//! Event bus over Redis Streams.
//!
//! Each topic is a stream; an envelope is one entry with a single `event` field
//! holding its JSON. Consumers read through a consumer group and acknowledge once
//! an entry is settled. Entries whose handler failed transiently stay pending and
//! are replayed, which gives at-least-once delivery.

use std::time::{Duration, Instant};

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::aio::MultiplexedConnection;
use deadpool_redis::redis::{self, AsyncConnectionConfig, RedisError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use passage_events::{EventEnvelope, Topic};

use crate::domain::repository::{EventPublisher, InboundHandler};
use crate::error::IdentityError;

const EVENT_FIELD: &str = "event";
const READ_COUNT: usize = 16;
const BLOCK_MS: u64 = 5_000;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const REPLAY_INTERVAL: Duration = Duration::from_secs(30);

/// `XREADGROUP` reply: streams → entries → (id, flat field/value list).
type StreamReply = Option<Vec<(String, Vec<(String, Vec<String>)>)>>;

// ── Publisher ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisStreamPublisher {
    pub pool: Pool,
}

impl EventPublisher for RedisStreamPublisher {
    async fn publish(&self, envelope: &EventEnvelope, topic: Topic) -> Result<(), IdentityError> {
        let payload = envelope.to_json().context("encode event envelope")?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| IdentityError::Internal(e.into()))?;
        let id: String = redis::cmd("XADD")
            .arg(topic.as_str())
            .arg("*")
            .arg(EVENT_FIELD)
            .arg(&payload)
            .query_async(&mut conn)
            .await
            .with_context(|| format!("publish {} to {topic}", envelope.event_type))?;
        debug!(%topic, event_type = %envelope.event_type, entry_id = %id, "event published");
        Ok(())
    }
}

// ── Consumer ─────────────────────────────────────────────────────────────────

/// Where the next `XREADGROUP` reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    /// Walking this consumer's pending entries, after the given id.
    Pending(String),
    /// Waiting for entries never delivered to the group.
    New,
}

impl Cursor {
    fn replay() -> Self {
        Cursor::Pending("0".to_owned())
    }

    fn id(&self) -> &str {
        match self {
            Cursor::Pending(id) => id,
            Cursor::New => ">",
        }
    }

    /// A pending walk continues after its last entry and ends on an empty batch.
    fn advance(self, last_id: Option<&str>) -> Self {
        match (self, last_id) {
            (Cursor::Pending(_), Some(id)) => Cursor::Pending(id.to_owned()),
            _ => Cursor::New,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Ack,
    /// Leave pending; the next replay hands it to the handler again.
    Retry,
}

/// Consumer-group reader on its own connection. Blocking reads outlive the
/// request pool's response timeout, so the consumer never shares that pool.
pub struct RedisStreamConsumer {
    pub client: redis::Client,
    pub topic: Topic,
    pub group: String,
    pub consumer: String,
}

impl RedisStreamConsumer {
    async fn connect(&self) -> Result<MultiplexedConnection, IdentityError> {
        let config = AsyncConnectionConfig::new().set_response_timeout(None);
        let conn = self
            .client
            .get_multiplexed_async_connection_with_config(&config)
            .await
            .context("connect stream consumer")?;
        Ok(conn)
    }

    /// Create the consumer group (and stream) if missing.
    async fn ensure_group(&self, conn: &mut MultiplexedConnection) -> Result<(), IdentityError> {
        let created: Result<(), RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(self.topic.as_str())
            .arg(&self.group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(conn)
            .await;
        match created {
            Ok(()) => Ok(()),
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(IdentityError::Internal(
                anyhow::Error::new(e).context("create consumer group"),
            )),
        }
    }

    /// Consume until `cancel` fires. Pending entries are replayed at start and then
    /// every [`REPLAY_INTERVAL`]; a dropped connection is reopened.
    pub async fn run<H>(self, handler: H, cancel: CancellationToken)
    where
        H: InboundHandler,
    {
        info!(topic = %self.topic, group = %self.group, consumer = %self.consumer, "event consumer started");

        let mut conn: Option<MultiplexedConnection> = None;
        let mut cursor = Cursor::replay();
        let mut last_replay = Instant::now();

        loop {
            let mut active = match conn.take() {
                Some(active) => active,
                None => match self.open().await {
                    Ok(active) => active,
                    Err(e) => {
                        warn!(error = ?e, topic = %self.topic, "stream connection failed");
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(RETRY_DELAY) => continue,
                        }
                    }
                },
            };

            if cursor == Cursor::New && last_replay.elapsed() >= REPLAY_INTERVAL {
                cursor = Cursor::replay();
            }

            let batch = tokio::select! {
                _ = cancel.cancelled() => break,
                batch = self.read(&mut active, cursor.id()) => batch,
            };
            let entries = match batch {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = ?e, topic = %self.topic, "stream read failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => continue,
                    }
                }
            };

            if matches!(cursor, Cursor::Pending(_)) {
                cursor = cursor.advance(entries.last().map(|(id, _)| id.as_str()));
                if cursor == Cursor::New {
                    last_replay = Instant::now();
                }
            }

            for (id, fields) in entries {
                match deliver(&handler, &id, &fields).await {
                    Delivery::Ack => {
                        if let Err(e) = self.ack(&mut active, &id).await {
                            warn!(error = ?e, entry_id = %id, "failed to acknowledge entry");
                        }
                    }
                    Delivery::Retry => {
                        debug!(entry_id = %id, "entry left pending for redelivery");
                    }
                }
            }
            conn = Some(active);
        }

        info!(topic = %self.topic, "event consumer stopped");
    }

    async fn open(&self) -> Result<MultiplexedConnection, IdentityError> {
        let mut conn = self.connect().await?;
        self.ensure_group(&mut conn).await?;
        Ok(conn)
    }

    async fn read(
        &self,
        conn: &mut MultiplexedConnection,
        cursor: &str,
    ) -> Result<Vec<(String, Vec<String>)>, IdentityError> {
        let reply: StreamReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.group)
            .arg(&self.consumer)
            .arg("COUNT")
            .arg(READ_COUNT)
            .arg("BLOCK")
            .arg(BLOCK_MS)
            .arg("STREAMS")
            .arg(self.topic.as_str())
            .arg(cursor)
            .query_async(conn)
            .await
            .context("read consumer group")?;
        Ok(reply
            .unwrap_or_default()
            .into_iter()
            .flat_map(|(_, entries)| entries)
            .collect())
    }

    async fn ack(&self, conn: &mut MultiplexedConnection, id: &str) -> Result<(), IdentityError> {
        let _acked: u64 = redis::cmd("XACK")
            .arg(self.topic.as_str())
            .arg(&self.group)
            .arg(id)
            .query_async(conn)
            .await
            .context("acknowledge entry")?;
        Ok(())
    }
}

/// Hand one entry to `handler`. Only `Internal` failures are retried; entries that
/// can never succeed are acknowledged so they do not come back.
async fn deliver<H>(handler: &H, id: &str, fields: &[String]) -> Delivery
where
    H: InboundHandler,
{
    let Some(raw) = field_value(fields, EVENT_FIELD) else {
        warn!(entry_id = %id, "entry without event field");
        return Delivery::Ack;
    };
    let envelope = match EventEnvelope::from_json(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, entry_id = %id, "undecodable envelope");
            return Delivery::Ack;
        }
    };
    match handler.handle(&envelope).await {
        Ok(()) => Delivery::Ack,
        Err(IdentityError::Internal(cause)) => {
            error!(error = ?cause, event_type = %envelope.event_type, key = %envelope.key, "event handler failed");
            Delivery::Retry
        }
        Err(other) => {
            warn!(kind = other.kind(), event_type = %envelope.event_type, key = %envelope.key, "event rejected");
            Delivery::Ack
        }
    }
}

fn field_value<'a>(fields: &'a [String], name: &str) -> Option<&'a str> {
    fields
        .chunks_exact(2)
        .find(|pair| pair[0] == name)
        .map(|pair| pair[1].as_str())
}
