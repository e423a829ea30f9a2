//! Duty role enumeration.
//!
//! Roles are a small fixed set; each role maps to one qualification flag
//! and one preference-percentage field on the member side. Code that
//! needs every role iterates [`Role::ALL`] rather than enumerating
//! variants by hand.

use serde::{Deserialize, Serialize};

/// A recurring duty role that must be staffed on every duty day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Flight instructor.
    Instructor,
    /// Tow pilot.
    TowPilot,
    /// Duty officer.
    DutyOfficer,
    /// Assistant duty officer.
    AssistantDutyOfficer,
}

impl Role {
    /// All roles, in the fixed scheduling order used by the greedy path.
    pub const ALL: [Role; 4] = [
        Role::Instructor,
        Role::TowPilot,
        Role::DutyOfficer,
        Role::AssistantDutyOfficer,
    ];

    /// Number of roles.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index into per-role tables (qualifications, percentages).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Role::Instructor => 0,
            Role::TowPilot => 1,
            Role::DutyOfficer => 2,
            Role::AssistantDutyOfficer => 3,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Role::Instructor => "instructor",
            Role::TowPilot => "tow pilot",
            Role::DutyOfficer => "duty officer",
            Role::AssistantDutyOfficer => "assistant duty officer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_indices_are_dense() {
        for (i, role) in Role::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
        }
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::Instructor.label(), "instructor");
        assert_eq!(Role::TowPilot.to_string(), "tow pilot");
    }

    #[test]
    fn test_role_serde_as_string() {
        let json = serde_json::to_string(&Role::DutyOfficer).unwrap();
        assert_eq!(json, "\"DutyOfficer\"");
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Role::DutyOfficer);
    }
}
