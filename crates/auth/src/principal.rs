use std::collections::BTreeSet;

use crate::{Identity, Role};

/// The authenticated identity bound to one request.
///
/// Built from an [`Identity`] resolved through the identity provider, never
/// from token claims alone, so role changes take effect on the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
    roles: BTreeSet<Role>,
}

impl Principal {
    pub fn new(username: impl Into<String>, roles: BTreeSet<Role>) -> Self {
        Self {
            username: username.into(),
            roles,
        }
    }

    pub fn from_identity(identity: &Identity) -> Self {
        Self::new(identity.username.clone(), identity.roles.clone())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }

    /// Owner-or-admin rule used for edits and deletes.
    pub fn may_modify(&self, owner: &str) -> bool {
        self.username == owner || self.is_admin()
    }
}
