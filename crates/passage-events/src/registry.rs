//! Explicit `event_type` tag → decoder table.

use std::collections::HashMap;

use crate::envelope::{DomainEvent, EventEnvelope, EventError};

type Decoder<T> = Box<dyn Fn(serde_json::Value) -> Result<T, serde_json::Error> + Send + Sync>;

/// Maps wire tags to decoders producing one consumer-side type `T` (usually an enum
/// with one variant per handled event).
pub struct EventRegistry<T> {
    decoders: HashMap<&'static str, Decoder<T>>,
}

impl<T: 'static> EventRegistry<T> {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register `E` under its `EVENT_TYPE`, converting decoded payloads with `wrap`.
    /// Registering the same tag twice replaces the earlier decoder.
    pub fn register<E>(mut self, wrap: fn(E) -> T) -> Self
    where
        E: DomainEvent + 'static,
    {
        self.decoders.insert(
            E::EVENT_TYPE,
            Box::new(move |payload| serde_json::from_value::<E>(payload).map(wrap)),
        );
        self
    }

    pub fn decode(&self, envelope: &EventEnvelope) -> Result<T, EventError> {
        let decoder = self
            .decoders
            .get(envelope.event_type.as_str())
            .ok_or_else(|| EventError::UnknownEventType(envelope.event_type.clone()))?;
        Ok(decoder(envelope.payload.clone())?)
    }
}

impl<T: 'static> Default for EventRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
