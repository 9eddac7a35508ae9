//! Account domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role stored on an account.
///
/// Sign-up wire format: `u8` (0 = Client, 1 = Organization, 2 = Admin).
/// `Anonymous` is never stored; it is the effective role of an inactive account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Anonymous,
    Client,
    Organization,
    Admin,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown account role: {0}")]
pub struct UnknownRole(pub String);

impl AccountRole {
    /// Convert from the sign-up `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Client),
            1 => Some(Self::Organization),
            2 => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Client => "client",
            Self::Organization => "organization",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anonymous" => Ok(Self::Anonymous),
            "client" => Ok(Self::Client),
            "organization" => Ok(Self::Organization),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// Identity record as seen by the use cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: uuid::Uuid,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub is_active: bool,
    pub role: AccountRole,
}

impl Account {
    /// Role honored for authorization: the stored role only once the account is active.
    pub fn effective_role(&self) -> AccountRole {
        if self.is_active {
            self.role
        } else {
            AccountRole::Anonymous
        }
    }
}
