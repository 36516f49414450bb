//! Declarative access requirements attached to navigable destinations.

use serde::{Deserialize, Serialize};

use classconnect_core::Role;

/// What a destination demands from the current session.
///
/// An empty `allowed_roles` set means "any authenticated identity", never
/// "no one": destinations opt *in* to role restriction. `require_write`
/// is a separate axis — it vetoes read-only identities regardless of role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(default)]
    pub allowed_roles: Vec<Role>,
    #[serde(default)]
    pub require_write: bool,
}

impl AccessPolicy {
    /// Any authenticated identity may enter.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Restrict to the given roles.
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed_roles: roles.into_iter().collect(),
            require_write: false,
        }
    }

    /// Additionally demand write capability.
    pub fn with_write(mut self) -> Self {
        self.require_write = true;
        self
    }

    /// Role-allowlist check only; the write axis is evaluated separately.
    pub fn allows_role(&self, role: Role) -> bool {
        self.allowed_roles.is_empty() || self.allowed_roles.contains(&role)
    }
}
