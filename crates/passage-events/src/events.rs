//! Event payloads exchanged with other services.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::DomainEvent;

// ── Outbound ─────────────────────────────────────────────────────────────────

/// Published when a profile is created; downstream services answer with
/// [`ProfileCreatedEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedEvent {
    pub auth_id: Uuid,
    pub profile_id: Uuid,
    pub email: String,
    pub role: String,
}

impl DomainEvent for UserCreatedEvent {
    const NAME: &'static str = "UserCreatedEvent";
    const EVENT_TYPE: &'static str = "user_created";
}

/// Email job consumed by the messaging service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailQueueEvent {
    pub id: Uuid,
    pub recipient: String,
    pub template: String,
    pub variables: HashMap<String, String>,
    pub send_at: DateTime<Utc>,
}

impl DomainEvent for EmailQueueEvent {
    const NAME: &'static str = "EmailQueueEvent";
    const EVENT_TYPE: &'static str = "email_queue";
}

// ── Inbound ──────────────────────────────────────────────────────────────────

/// Downstream confirmation for a pending profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCreatedEvent {
    pub profile_id: Uuid,
    pub auth_id: Uuid,
    pub role: String,
}

impl DomainEvent for ProfileCreatedEvent {
    const NAME: &'static str = "ProfileCreatedEvent";
    const EVENT_TYPE: &'static str = "profile_created";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreatedEvent {
    pub group_id: Uuid,
    pub creator_id: Uuid,
}

impl DomainEvent for GroupCreatedEvent {
    const NAME: &'static str = "GroupCreatedEvent";
    const EVENT_TYPE: &'static str = "group_created";
}

/// `role` is the chat role wire integer (0 member, 1 moderator, 2 admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteAcceptedEvent {
    pub invite_id: Uuid,
    pub group_id: Uuid,
    pub invitee_id: Uuid,
    pub role: i32,
}

impl DomainEvent for InviteAcceptedEvent {
    const NAME: &'static str = "InviteAcceptedEvent";
    const EVENT_TYPE: &'static str = "invite_accepted";
}
