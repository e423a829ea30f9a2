//! Roster formulation on top of the constraint model.
//!
//! Builds a sparse binary decision space over (member, role, day)
//! triples, encodes the hard roster constraints, encodes the weighted
//! soft-preference objective, and decodes a solver assignment back into
//! a [`Schedule`].
//!
//! # Sparse construction
//!
//! Variables are created only for triples that survive cheap
//! pre-filtering: schedulable members, qualified (member, role) pairs
//! with a non-zero override-adjusted percentage, and days the member is
//! not blacked out. This shrinks the search space before any constraint
//! is added.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::ScheduleError;
use crate::models::{DayRoster, DutyPreference, Role, Schedule, SchedulingSnapshot};
use crate::solver::model::{BoolVar, CpModel};
use crate::solver::search::{CpSolver, SearchStats, SolverConfig};

/// Objective bonus per pairing co-occurrence (triple the base weight).
pub const PAIRING_BONUS: i64 = 200;

/// A solved roster with its solver diagnostics.
#[derive(Debug, Clone)]
pub struct OptimizedRoster {
    /// The complete schedule (every slot filled).
    pub schedule: Schedule,
    /// Achieved objective value.
    pub objective: i64,
    /// Search effort counters.
    pub stats: SearchStats,
}

/// Builds and solves the roster constraint model.
pub struct RosterModelBuilder<'a> {
    snapshot: &'a SchedulingSnapshot,
    roles: &'a [Role],
}

impl<'a> RosterModelBuilder<'a> {
    /// Creates a builder over an immutable snapshot.
    pub fn new(snapshot: &'a SchedulingSnapshot, roles: &'a [Role]) -> Self {
        Self { snapshot, roles }
    }

    /// Builds the model and searches for an optimal assignment.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::StructuralInfeasibility`] when a slot has zero
    /// eligible candidates (raised before any search), or
    /// [`ScheduleError::SolverFailure`] when the search proves the model
    /// infeasible or runs out of time without any solution.
    pub fn solve(&self, config: &SolverConfig) -> Result<OptimizedRoster, ScheduleError> {
        let (model, vars) = self.build()?;
        debug!(
            vars = model.var_count(),
            constraints = model.constraint_count(),
            days = self.snapshot.duty_days.len(),
            "roster model built"
        );

        let solution = CpSolver::new(config.clone()).solve(&model);
        if !solution.status.has_solution() {
            return Err(ScheduleError::SolverFailure {
                status: solution.status,
                stats: solution.stats,
            });
        }

        let mut schedule = Schedule::new();
        for (day_idx, &date) in self.snapshot.duty_days.iter().enumerate() {
            let mut day = DayRoster::new(date, self.roles);
            for &role in self.roles {
                for (member_idx, member) in self.snapshot.members.iter().enumerate() {
                    if let Some(var) = vars.get(&(member_idx, role, day_idx)) {
                        if solution.values[var.index()] {
                            day.assign(role, member.id.clone());
                        }
                    }
                }
            }
            schedule.push_day(day);
        }

        Ok(OptimizedRoster {
            schedule,
            objective: solution.objective,
            stats: solution.stats,
        })
    }

    /// Builds the constraint model and the (member, role, day) → var map.
    fn build(&self) -> Result<(CpModel, VarMap), ScheduleError> {
        let snapshot = self.snapshot;
        let anchor = snapshot.anchor_date();
        let mut model = CpModel::new();
        let mut vars: VarMap = HashMap::new();

        let preferences: Vec<DutyPreference> = snapshot
            .members
            .iter()
            .map(|m| snapshot.preference_for(&m.id))
            .collect();

        // Sparse variable construction with the objective's preference
        // and staleness terms attached as each variable is created.
        for (member_idx, member) in snapshot.members.iter().enumerate() {
            let pref = &preferences[member_idx];
            if !pref.schedulable() {
                continue;
            }
            let staleness = pref.staleness_days(anchor);
            for &role in self.roles {
                let percent = pref.effective_percent(member, role);
                if percent == 0 {
                    continue;
                }
                for (day_idx, &date) in snapshot.duty_days.iter().enumerate() {
                    if snapshot.is_blacked_out(&member.id, date) {
                        continue;
                    }
                    let var = model.new_bool_var();
                    model.add_objective_term(var, i64::from(percent) + staleness);
                    vars.insert((member_idx, role, day_idx), var);
                }
            }
        }

        // Slot coverage, scarcest role first so a structural hole in the
        // tightest pool is the one reported.
        for role in self.roles_by_scarcity() {
            for (day_idx, &date) in snapshot.duty_days.iter().enumerate() {
                let slot_vars = self.collect_vars(&vars, |(_, r, d)| *r == role && *d == day_idx);
                if slot_vars.is_empty() {
                    return Err(ScheduleError::StructuralInfeasibility { role, date });
                }
                model.add_exactly_one(&slot_vars);
            }
        }

        for member_idx in 0..snapshot.members.len() {
            // One role per member per day.
            for day_idx in 0..snapshot.duty_days.len() {
                let day_vars =
                    self.collect_vars(&vars, |(m, _, d)| *m == member_idx && *d == day_idx);
                if day_vars.len() > 1 {
                    model.add_at_most_one(&day_vars);
                }
            }

            // No identical role on two calendar-consecutive days. Duty
            // days are chronological, so only list-adjacent pairs can be
            // one calendar day apart.
            for day_idx in 1..snapshot.duty_days.len() {
                let gap = snapshot.duty_days[day_idx] - snapshot.duty_days[day_idx - 1];
                if gap != chrono::Duration::days(1) {
                    continue;
                }
                for &role in self.roles {
                    if let (Some(&a), Some(&b)) = (
                        vars.get(&(member_idx, role, day_idx - 1)),
                        vars.get(&(member_idx, role, day_idx)),
                    ) {
                        model.add_at_most_one(&[a, b]);
                    }
                }
            }

            // Monthly cap across the whole period.
            let member_vars = self.collect_vars(&vars, |(m, _, _)| *m == member_idx);
            if !member_vars.is_empty() {
                model.add_linear_le(&member_vars, preferences[member_idx].monthly_cap());
            }
        }

        // Avoidance pairs may never share a day, in any roles.
        let index_of: HashMap<&str, usize> = snapshot
            .members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.as_str(), i))
            .collect();
        for pair in &snapshot.avoidances {
            let (Some(&a), Some(&b)) = (index_of.get(pair.first()), index_of.get(pair.second()))
            else {
                continue;
            };
            for day_idx in 0..snapshot.duty_days.len() {
                let both: Vec<BoolVar> = self
                    .collect_vars(&vars, |(m, _, d)| (*m == a || *m == b) && *d == day_idx);
                if both.len() > 1 {
                    model.add_at_most_one(&both);
                }
            }
        }

        // Pairing bonus: reward days where both members of a pair are
        // assigned to any role, via assigned-today indicators.
        for pair in &snapshot.pairings {
            let (Some(&a), Some(&b)) = (index_of.get(pair.first()), index_of.get(pair.second()))
            else {
                continue;
            };
            for day_idx in 0..snapshot.duty_days.len() {
                let a_vars = self.collect_vars(&vars, |(m, _, d)| *m == a && *d == day_idx);
                let b_vars = self.collect_vars(&vars, |(m, _, d)| *m == b && *d == day_idx);
                if a_vars.is_empty() || b_vars.is_empty() {
                    continue;
                }
                let a_today = model.new_bool_var();
                model.add_or(a_today, &a_vars);
                let b_today = model.new_bool_var();
                model.add_or(b_today, &b_vars);
                let together = model.new_bool_var();
                model.add_and(together, &[a_today, b_today]);
                model.add_objective_term(together, PAIRING_BONUS);
            }
        }

        Ok((model, vars))
    }

    /// Roles ordered scarcest first per the snapshot's scarcity data;
    /// roles without scarcity data keep their given position at the end.
    fn roles_by_scarcity(&self) -> Vec<Role> {
        let ratio: HashMap<Role, f64> = self
            .snapshot
            .scarcity
            .iter()
            .map(|s| (s.role, s.ratio))
            .collect();
        let mut ordered: Vec<Role> = self.roles.to_vec();
        ordered.sort_by(|a, b| {
            let ra = ratio.get(a).copied().unwrap_or(f64::MAX);
            let rb = ratio.get(b).copied().unwrap_or(f64::MAX);
            ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
        });
        ordered
    }

    fn collect_vars(
        &self,
        vars: &VarMap,
        mut keep: impl FnMut(&(usize, Role, usize)) -> bool,
    ) -> Vec<BoolVar> {
        let mut selected: Vec<(usize, Role, usize, BoolVar)> = vars
            .iter()
            .filter(|(key, _)| keep(*key))
            .map(|(&(m, r, d), &v)| (m, r, d, v))
            .collect();
        // Deterministic model construction regardless of hash order.
        selected.sort_by_key(|&(m, r, d, _)| (d, r, m));
        selected.into_iter().map(|(_, _, _, v)| v).collect()
    }
}

type VarMap = HashMap<(usize, Role, usize), BoolVar>;
