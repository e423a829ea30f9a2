//! Club member model.
//!
//! A member carries a fixed set of boolean role qualifications and an
//! active flag. Members are immutable for the duration of one scheduling
//! run; mutation happens in the out-of-scope data store.

use serde::{Deserialize, Serialize};

use super::Role;

/// A club member who may be assigned duty roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Unique member identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether the member is an active club member.
    pub active: bool,
    /// Qualification flags, one per role.
    qualified: [bool; Role::COUNT],
}

impl Member {
    /// Creates an active member with no qualifications.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            active: true,
            qualified: [false; Role::COUNT],
        }
    }

    /// Sets the member name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the member as qualified for a role.
    pub fn with_qualification(mut self, role: Role) -> Self {
        self.qualified[role.index()] = true;
        self
    }

    /// Sets the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Whether the member holds the qualification for `role`.
    #[inline]
    pub fn is_qualified(&self, role: Role) -> bool {
        self.qualified[role.index()]
    }

    /// Roles the member is qualified for, in fixed role order.
    pub fn qualified_roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.is_qualified(*r))
            .collect()
    }
}
