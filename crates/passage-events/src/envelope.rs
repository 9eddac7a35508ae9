//! Versioned wire envelope shared by every published event.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current envelope schema version.
pub const ENVELOPE_VERSION: u32 = 1;

/// `metadata.source` stamped on everything this service publishes.
pub const AUTH_SOURCE: &str = "auth_events";

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("no decoder registered for event type {0:?}")]
    UnknownEventType(String),
    #[error("failed to decode event payload")]
    Decode(#[from] serde_json::Error),
}

/// A payload that can travel inside an [`EventEnvelope`].
///
/// `EVENT_TYPE` is the explicit registry tag. It must equal
/// [`event_type_from_name`] applied to `NAME`; each event's tests check this.
pub trait DomainEvent: Serialize + DeserializeOwned {
    const NAME: &'static str;
    const EVENT_TYPE: &'static str;
}

/// Derive a wire tag from an event type name: the `Event` suffix is stripped and
/// the rest is snake_cased (`UserCreatedEvent` → `user_created`).
pub fn event_type_from_name(name: &str) -> String {
    let stem = name.strip_suffix("Event").unwrap_or(name);
    let mut tag = String::with_capacity(stem.len() + 4);
    for (i, c) in stem.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                tag.push('_');
            }
            tag.push(c.to_ascii_lowercase());
        } else {
            tag.push(c);
        }
    }
    tag
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub source: String,
}

/// `{key, version, metadata:{source}, payload, event_type, occurred_at}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub version: u32,
    pub metadata: Metadata,
    /// Idempotency token.
    pub key: String,
    pub payload: serde_json::Value,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Wrap `event` with a fresh key and the current time.
    pub fn wrap<E: DomainEvent>(event: &E, source: &str) -> Result<Self, EventError> {
        Ok(Self {
            version: ENVELOPE_VERSION,
            metadata: Metadata {
                source: source.to_owned(),
            },
            key: Uuid::new_v4().to_string(),
            payload: serde_json::to_value(event)?,
            event_type: E::EVENT_TYPE.to_owned(),
            occurred_at: Utc::now(),
        })
    }

    pub fn to_json(&self) -> Result<String, EventError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(raw)?)
    }
}
