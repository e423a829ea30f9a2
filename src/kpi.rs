//! Roster quality metrics (KPIs).
//!
//! Computes standard roster quality indicators from a completed
//! schedule and the member list it was built for.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Fill Rate | Fraction of slots with an assignee |
//! | Unfilled by Role | Empty-slot count per role |
//! | Assignments by Member | Duty count per member (zeroes included) |
//! | Fairness Spread | Max minus min duty count across members |
//! | Avg Assignments | Mean duty count per member |

use std::collections::HashMap;

use crate::models::{Member, Role, Schedule};

/// Roster quality indicators.
#[derive(Debug, Clone)]
pub struct RosterKpi {
    /// Fraction of slots that are filled (0.0..1.0).
    pub fill_rate: f64,
    /// Total slots across all days and roles.
    pub total_slots: usize,
    /// Slots with an assignee.
    pub filled_slots: usize,
    /// Empty-slot count per role (roles with none are absent).
    pub unfilled_by_role: HashMap<Role, usize>,
    /// Duty count per member, including members with zero duties.
    pub assignments_by_member: HashMap<String, usize>,
    /// Largest minus smallest duty count across the member list.
    pub fairness_spread: usize,
    /// Mean duty count per member.
    pub avg_assignments: f64,
}

impl RosterKpi {
    /// Computes KPIs from a schedule and the members it covers.
    ///
    /// `members` determines whose zero counts enter the fairness
    /// figures; assignees outside the list are still counted.
    pub fn calculate(schedule: &Schedule, members: &[Member]) -> Self {
        let total_slots = schedule.slot_count();
        let filled_slots = schedule.filled_count();

        let mut unfilled_by_role: HashMap<Role, usize> = HashMap::new();
        for day in &schedule.days {
            for (role, assignee) in &day.slots {
                if assignee.is_none() {
                    *unfilled_by_role.entry(*role).or_insert(0) += 1;
                }
            }
        }

        let mut assignments_by_member = schedule.assignments_per_member();
        for member in members {
            assignments_by_member.entry(member.id.clone()).or_insert(0);
        }

        let (fairness_spread, avg_assignments) = if assignments_by_member.is_empty() {
            (0, 0.0)
        } else {
            let max = assignments_by_member.values().max().copied().unwrap_or(0);
            let min = assignments_by_member.values().min().copied().unwrap_or(0);
            let sum: usize = assignments_by_member.values().sum();
            (max - min, sum as f64 / assignments_by_member.len() as f64)
        };

        Self {
            fill_rate: schedule.fill_rate(),
            total_slots,
            filled_slots,
            unfilled_by_role,
            assignments_by_member,
            fairness_spread,
            avg_assignments,
        }
    }

    /// Whether the roster meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_fill_rate: f64, max_spread: usize) -> bool {
        self.fill_rate >= min_fill_rate && self.fairness_spread <= max_spread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayRoster;
    use chrono::NaiveDate;

    const ROLES: [Role; 2] = [Role::Instructor, Role::TowPilot];

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn members(ids: &[&str]) -> Vec<Member> {
        ids.iter().map(|id| Member::new(*id)).collect()
    }

    fn sample_schedule() -> Schedule {
        let mut schedule = Schedule::new();

        let mut d1 = DayRoster::new(date(1), &ROLES);
        d1.assign(Role::Instructor, "alice");
        d1.assign(Role::TowPilot, "bob");
        schedule.push_day(d1);

        let mut d2 = DayRoster::new(date(2), &ROLES);
        d2.assign(Role::Instructor, "alice");
        d2.leave_unfilled(Role::TowPilot, "no eligible members");
        schedule.push_day(d2);

        schedule
    }

    #[test]
    fn test_kpi_basic() {
        let kpi = RosterKpi::calculate(&sample_schedule(), &members(&["alice", "bob"]));
        assert_eq!(kpi.total_slots, 4);
        assert_eq!(kpi.filled_slots, 3);
        assert!((kpi.fill_rate - 0.75).abs() < 1e-10);
        assert_eq!(kpi.unfilled_by_role[&Role::TowPilot], 1);
        assert!(!kpi.unfilled_by_role.contains_key(&Role::Instructor));
    }

    #[test]
    fn test_kpi_fairness_counts_idle_members() {
        let kpi = RosterKpi::calculate(&sample_schedule(), &members(&["alice", "bob", "carol"]));
        assert_eq!(kpi.assignments_by_member["alice"], 2);
        assert_eq!(kpi.assignments_by_member["carol"], 0);
        assert_eq!(kpi.fairness_spread, 2);
        assert!((kpi.avg_assignments - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = RosterKpi::calculate(&Schedule::new(), &[]);
        assert_eq!(kpi.total_slots, 0);
        assert_eq!(kpi.fairness_spread, 0);
        assert!((kpi.fill_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_meets_thresholds() {
        let kpi = RosterKpi::calculate(&sample_schedule(), &members(&["alice", "bob"]));
        assert!(kpi.meets_thresholds(0.7, 1));
        assert!(!kpi.meets_thresholds(0.8, 1));
        assert!(!kpi.meets_thresholds(0.7, 0));
    }
}
