//! Permission Resolver: role + activation state → ordered permission list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountRole};

/// A single capability string embedded in a token's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "profile:create")]
    ProfileCreate,
    #[serde(rename = "profile:view")]
    ProfileView,
    #[serde(rename = "profile:delete")]
    ProfileDelete,
    #[serde(rename = "profile:update")]
    ProfileUpdate,
    #[serde(rename = "group:create")]
    GroupCreate,
    #[serde(rename = "group:view")]
    GroupView,
    #[serde(rename = "group:delete")]
    GroupDelete,
    #[serde(rename = "group:update")]
    GroupUpdate,
    #[serde(rename = "member:kick")]
    MemberKick,
    #[serde(rename = "member:change_role")]
    MemberChangeRole,
    #[serde(rename = "invite:accept")]
    InviteAccept,
    #[serde(rename = "invite:create")]
    InviteCreate,
    #[serde(rename = "invite:decline")]
    InviteDecline,
    #[serde(rename = "message:view")]
    MessageView,
    #[serde(rename = "notification:view")]
    NotificationView,
}

impl Permission {
    pub const ALL: [Permission; 15] = [
        Self::ProfileCreate,
        Self::ProfileView,
        Self::ProfileDelete,
        Self::ProfileUpdate,
        Self::GroupCreate,
        Self::GroupView,
        Self::GroupDelete,
        Self::GroupUpdate,
        Self::MemberKick,
        Self::MemberChangeRole,
        Self::InviteAccept,
        Self::InviteCreate,
        Self::InviteDecline,
        Self::MessageView,
        Self::NotificationView,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProfileCreate => "profile:create",
            Self::ProfileView => "profile:view",
            Self::ProfileDelete => "profile:delete",
            Self::ProfileUpdate => "profile:update",
            Self::GroupCreate => "group:create",
            Self::GroupView => "group:view",
            Self::GroupDelete => "group:delete",
            Self::GroupUpdate => "group:update",
            Self::MemberKick => "member:kick",
            Self::MemberChangeRole => "member:change_role",
            Self::InviteAccept => "invite:accept",
            Self::InviteCreate => "invite:create",
            Self::InviteDecline => "invite:decline",
            Self::MessageView => "message:view",
            Self::NotificationView => "notification:view",
        }
    }
}

const CLIENT_PERMISSIONS: [Permission; 15] = [
    Permission::ProfileCreate,
    Permission::ProfileView,
    Permission::ProfileDelete,
    Permission::ProfileUpdate,
    Permission::GroupCreate,
    Permission::GroupView,
    Permission::GroupDelete,
    Permission::GroupUpdate,
    Permission::MemberKick,
    Permission::MemberChangeRole,
    Permission::InviteAccept,
    Permission::InviteCreate,
    Permission::InviteDecline,
    Permission::MessageView,
    Permission::NotificationView,
];

/// Immutable role → permissions lookup.
///
/// Each list keeps its construction order with duplicates removed, so resolution is
/// deterministic regardless of map iteration order. Roles missing from the table
/// resolve to an empty scope.
#[derive(Debug, Clone)]
pub struct PermissionTable {
    roles: HashMap<AccountRole, Vec<Permission>>,
}

impl PermissionTable {
    pub fn new(entries: impl IntoIterator<Item = (AccountRole, Vec<Permission>)>) -> Self {
        let roles = entries
            .into_iter()
            .map(|(role, permissions)| {
                let mut unique = Vec::with_capacity(permissions.len());
                for permission in permissions {
                    if !unique.contains(&permission) {
                        unique.push(permission);
                    }
                }
                (role, unique)
            })
            .collect();
        Self { roles }
    }

    /// Table used by the identity service at start-up.
    pub fn standard() -> Self {
        Self::new([
            (AccountRole::Anonymous, vec![Permission::ProfileCreate]),
            (AccountRole::Client, CLIENT_PERMISSIONS.to_vec()),
            (AccountRole::Organization, CLIENT_PERMISSIONS.to_vec()),
            (AccountRole::Admin, Permission::ALL.to_vec()),
        ])
    }

    /// Permissions for `role`, or the anonymous set when the account is inactive.
    pub fn resolve(&self, role: AccountRole, is_active: bool) -> &[Permission] {
        let effective = if is_active { role } else { AccountRole::Anonymous };
        self.lookup(effective)
    }

    /// Token scope strings for an account.
    pub fn scope_for(&self, account: &Account) -> Vec<String> {
        self.lookup(account.effective_role())
            .iter()
            .map(|p| p.as_str().to_owned())
            .collect()
    }

    fn lookup(&self, role: AccountRole) -> &[Permission] {
        self.roles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::standard()
    }
}
