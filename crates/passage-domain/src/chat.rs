//! Group chat membership types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a member inside a group chat.
///
/// Event wire format: integer (0 = Member, 1 = Moderator, 2 = Admin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Member,
    Moderator,
    Admin,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown chat role: {0}")]
pub struct UnknownChatRole(pub String);

impl ChatRole {
    /// Unknown values fall back to `Member`.
    pub fn from_wire(v: i32) -> Self {
        match v {
            1 => Self::Moderator,
            2 => Self::Admin,
            _ => Self::Member,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatRole {
    type Err = UnknownChatRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownChatRole(other.to_owned())),
        }
    }
}

/// Permission row linking a member to a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberChat {
    pub id: Uuid,
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub role: ChatRole,
}

impl MemberChat {
    pub fn new(group_id: Uuid, member_id: Uuid, role: ChatRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            member_id,
            role,
        }
    }
}
