//! Input validation for scheduling snapshots.
//!
//! Checks structural integrity of a snapshot before scheduling. Detects:
//! - Duplicate member IDs
//! - Preference, blackout, and pair references to unknown members
//! - Out-of-range willingness percentages
//! - Duty days out of chronological order
//!
//! All checks are accumulated; a snapshot with three problems reports
//! all three in one pass.

use std::collections::HashSet;

use crate::models::{Role, SchedulingSnapshot};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two members share the same ID.
    DuplicateId,
    /// A record references a member that doesn't exist.
    DanglingReference,
    /// A willingness percentage exceeds 100.
    InvalidPercentage,
    /// Duty days are not strictly increasing.
    UnorderedDutyDays,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a scheduling snapshot.
///
/// Checks:
/// 1. No duplicate member IDs
/// 2. All preference records belong to known members
/// 3. All blackouts belong to known members
/// 4. Both sides of every avoidance and pairing pair are known members
/// 5. All stored percentages are within 0–100
/// 6. Duty days are strictly increasing
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_snapshot(snapshot: &SchedulingSnapshot) -> ValidationResult {
    let mut errors = Vec::new();

    let mut member_ids = HashSet::new();
    for member in &snapshot.members {
        if !member_ids.insert(member.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate member ID: {}", member.id),
            ));
        }
    }

    for (member_id, pref) in &snapshot.preferences {
        if !member_ids.contains(member_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!("Preference record for unknown member: {member_id}"),
            ));
        }
        for role in Role::ALL {
            if pref.percent(role) > 100 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPercentage,
                    format!(
                        "Percentage {}% for {role} exceeds 100 (member {member_id})",
                        pref.percent(role)
                    ),
                ));
            }
        }
    }

    for blackout in &snapshot.blackouts {
        if !member_ids.contains(blackout.member_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!("Blackout for unknown member: {}", blackout.member_id),
            ));
        }
    }

    for (label, pairs) in [
        ("Avoidance", &snapshot.avoidances),
        ("Pairing", &snapshot.pairings),
    ] {
        for pair in pairs {
            for side in [pair.first(), pair.second()] {
                if !member_ids.contains(side) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::DanglingReference,
                        format!("{label} pair references unknown member: {side}"),
                    ));
                }
            }
        }
    }

    for window in snapshot.duty_days.windows(2) {
        if window[0] >= window[1] {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnorderedDutyDays,
                format!("Duty days out of order: {} then {}", window[0], window[1]),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
