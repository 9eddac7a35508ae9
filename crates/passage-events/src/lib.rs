//! Domain event envelope and the explicit event-type registry.
//!
//! Every event is published inside an [`EventEnvelope`]. Consumers pick a decoder
//! from an [`EventRegistry`] by the wire `event_type` tag; nothing is resolved by
//! runtime type introspection.

pub mod envelope;
pub mod events;
pub mod registry;
pub mod topic;

pub use envelope::{DomainEvent, EventEnvelope, EventError, event_type_from_name};
pub use registry::EventRegistry;
pub use topic::Topic;
