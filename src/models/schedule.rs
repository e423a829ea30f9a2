//! Roster schedule (solution) model.
//!
//! A schedule is an ordered list of duty days, each mapping every
//! requested role to an assigned member or to `None` plus a diagnostic
//! explaining why the slot stayed empty. It is produced fresh on each
//! scheduling run and never mutated afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::Role;

/// One duty day's assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRoster {
    /// Calendar date of the duty day.
    pub date: NaiveDate,
    /// Role → assigned member id, or `None` for an unfilled slot.
    pub slots: BTreeMap<Role, Option<String>>,
    /// Role → explanation for slots left unfilled.
    pub diagnostics: BTreeMap<Role, String>,
}

impl DayRoster {
    /// Creates an empty day roster for the given roles.
    pub fn new(date: NaiveDate, roles: &[Role]) -> Self {
        Self {
            date,
            slots: roles.iter().map(|r| (*r, None)).collect(),
            diagnostics: BTreeMap::new(),
        }
    }

    /// Assigns a member to a role slot.
    pub fn assign(&mut self, role: Role, member_id: impl Into<String>) {
        self.slots.insert(role, Some(member_id.into()));
    }

    /// Leaves a slot unfilled with an explanation.
    pub fn leave_unfilled(&mut self, role: Role, reason: impl Into<String>) {
        self.slots.insert(role, None);
        self.diagnostics.insert(role, reason.into());
    }

    /// Member ids assigned on this day, across all roles.
    pub fn assigned_members(&self) -> Vec<&str> {
        self.slots.values().filter_map(|m| m.as_deref()).collect()
    }

    /// Whether the member holds any role on this day.
    pub fn has_member(&self, member_id: &str) -> bool {
        self.slots.values().any(|m| m.as_deref() == Some(member_id))
    }

    /// Number of filled slots.
    pub fn filled_count(&self) -> usize {
        self.slots.values().filter(|m| m.is_some()).count()
    }
}

/// A complete roster for a scheduling period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// Day rosters in chronological order.
    pub days: Vec<DayRoster>,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a day roster.
    pub fn push_day(&mut self, day: DayRoster) {
        self.days.push(day);
    }

    /// Number of duty days.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Total number of slots (filled or not).
    pub fn slot_count(&self) -> usize {
        self.days.iter().map(|d| d.slots.len()).sum()
    }

    /// Total number of filled slots.
    pub fn filled_count(&self) -> usize {
        self.days.iter().map(|d| d.filled_count()).sum()
    }

    /// Fraction of slots that are filled (1.0 for an empty schedule).
    pub fn fill_rate(&self) -> f64 {
        let total = self.slot_count();
        if total == 0 {
            return 1.0;
        }
        self.filled_count() as f64 / total as f64
    }

    /// Assignment count per member across all days and roles.
    pub fn assignments_per_member(&self) -> HashMap<String, usize> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for day in &self.days {
            for member in day.assigned_members() {
                *counts.entry(member.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// The member assigned to `role` on `date`, if any.
    pub fn member_for(&self, date: NaiveDate, role: Role) -> Option<&str> {
        self.days
            .iter()
            .find(|d| d.date == date)
            .and_then(|d| d.slots.get(&role))
            .and_then(|m| m.as_deref())
    }
}
