//! Profile domain types and main/sub partitioning.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Grant carried by a profile.
///
/// Wire format: `u8` (0 = Main, 1 = Sub).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    Main = 0,
    Sub = 1,
}

impl GrantType {
    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Main),
            1 => Some(Self::Sub),
            _ => None,
        }
    }

    /// Convert to `u8` wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A grant scoping an account's access. At most one `Main` per account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub grant_type: GrantType,
}

impl Profile {
    pub fn new(account_id: Uuid, grant_type: GrantType) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            grant_type,
        }
    }
}

/// Partition attached profiles into the main profile and its siblings.
///
/// `None` for the main profile means the account has no main grant, which callers
/// must treat as a data-integrity failure. If the data is corrupt and holds more than
/// one main, the first one wins and the rest are reported as siblings.
pub fn filter_profiles(profiles: &[Profile]) -> (Option<Profile>, Vec<Profile>) {
    let mut main = None;
    let mut subs = Vec::with_capacity(profiles.len().saturating_sub(1));

    for profile in profiles {
        if main.is_none() && profile.grant_type == GrantType::Main {
            main = Some(profile.clone());
        } else {
            subs.push(profile.clone());
        }
    }

    (main, subs)
}
