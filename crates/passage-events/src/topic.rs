use std::fmt;

/// Broker topics (stream names) used by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Outbound account lifecycle events.
    AuthEvents,
    /// Inbound events from the messaging service.
    MessagingEvents,
    /// Outbound email jobs.
    MessagingEventsEmail,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthEvents => "auth_events",
            Self::MessagingEvents => "messaging_events",
            Self::MessagingEventsEmail => "messaging_events_email",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
