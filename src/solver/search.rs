//! Branch-and-bound search over a [`CpModel`].
//!
//! # Algorithm
//!
//! Depth-first search branching on exactly-one groups (each group is a
//! slot that must pick one candidate), with unit-style propagation over
//! all constraint kinds and an optimistic objective bound for pruning.
//! The incumbent best solution is kept while the search continues, so a
//! wall-clock timeout still returns the best feasible roster found.
//!
//! # Determinism
//!
//! Candidate ordering is fixed at solve start: objective weight
//! descending, ties broken by a permutation drawn from the configured
//! seed. With a fixed seed and a single worker, repeated solves on
//! identical input produce byte-identical solutions. With several
//! workers, a seed-offset portfolio runs concurrently and the merge rule
//! (best objective, lowest worker index on ties) is itself deterministic.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::model::{CpConstraint, CpModel};

/// Outcome classification of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    /// Best solution found and proven optimal.
    Optimal,
    /// Solution found, optimality not proven within the time budget.
    Feasible,
    /// Proven to have no solution.
    Infeasible,
    /// Time budget exhausted before any solution was found.
    Unknown,
}

impl SolverStatus {
    /// Whether this status carries a usable assignment.
    pub fn has_solution(self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Feasible)
    }
}

/// Search effort counters, reported with every solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Dead ends encountered (failed propagations and rejected leaves).
    pub conflicts: u64,
    /// Branching decisions taken.
    pub branches: u64,
}

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock search budget.
    pub time_budget: Duration,
    /// Seed for candidate-order tie-breaking.
    pub seed: u64,
    /// Number of portfolio workers. 1 = fully sequential search.
    pub workers: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(10),
            seed: 0,
            workers: 1,
        }
    }
}

impl SolverConfig {
    /// Creates a config with the given time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Sets the tie-break seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the portfolio worker count (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Result of one solve.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Outcome classification.
    pub status: SolverStatus,
    /// Variable assignment (meaningful only when `status.has_solution()`).
    pub values: Vec<bool>,
    /// Objective value of `values`.
    pub objective: i64,
    /// Search effort counters.
    pub stats: SearchStats,
}

/// Branch-and-bound solver for [`CpModel`].
#[derive(Debug, Clone, Default)]
pub struct CpSolver {
    config: SolverConfig,
}

impl CpSolver {
    /// Creates a solver with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Searches for a maximum-objective assignment.
    pub fn solve(&self, model: &CpModel) -> CpSolution {
        let solution = if self.config.workers <= 1 {
            run_search(model, self.config.seed, self.config.time_budget)
        } else {
            self.solve_portfolio(model)
        };
        debug!(
            status = ?solution.status,
            objective = solution.objective,
            conflicts = solution.stats.conflicts,
            branches = solution.stats.branches,
            "solve finished"
        );
        solution
    }

    /// Runs `workers` seed-offset searches and merges deterministically.
    fn solve_portfolio(&self, model: &CpModel) -> CpSolution {
        let budget = self.config.time_budget;
        let base_seed = self.config.seed;
        let mut results: Vec<CpSolution> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..self.config.workers)
                .map(|i| {
                    scope.spawn(move || run_search(model, base_seed.wrapping_add(i as u64), budget))
                })
                .collect();
            handles.into_iter().map(|h| h.join().expect("solver worker panicked")).collect()
        });

        // Lowest worker index wins ties, so drain in spawn order.
        let mut merged = results.remove(0);
        for candidate in results {
            merged.stats.conflicts += candidate.stats.conflicts;
            merged.stats.branches += candidate.stats.branches;
            let better = match (merged.status.has_solution(), candidate.status.has_solution()) {
                (false, true) => true,
                (true, false) => false,
                (true, true) => {
                    candidate.objective > merged.objective
                        || (candidate.status == SolverStatus::Optimal
                            && merged.status != SolverStatus::Optimal
                            && candidate.objective >= merged.objective)
                }
                (false, false) => candidate.status == SolverStatus::Infeasible,
            };
            if better {
                let stats = merged.stats;
                merged = candidate;
                merged.stats = stats;
            }
        }
        merged
    }
}

/// One complete sequential search.
fn run_search(model: &CpModel, seed: u64, budget: Duration) -> CpSolution {
    let mut search = Search::new(model, seed, Instant::now() + budget);
    search.run()
}

struct Search<'a> {
    model: &'a CpModel,
    values: Vec<Option<bool>>,
    trail: Vec<usize>,
    /// var → indices of constraints mentioning it.
    watchers: Vec<Vec<usize>>,
    /// Constraint indices of exactly-one groups (the decision slots).
    groups: Vec<usize>,
    /// Per-group candidate order: weight descending, seeded tie-break.
    candidate_order: Vec<Vec<usize>>,
    current_objective: i64,
    /// Sum of positive weights of still-unfixed variables (bound term).
    open_positive: i64,
    best: Option<(i64, Vec<bool>)>,
    stats: SearchStats,
    deadline: Instant,
    node_counter: u64,
    timed_out: bool,
    aborted: bool,
}

impl<'a> Search<'a> {
    fn new(model: &'a CpModel, seed: u64, deadline: Instant) -> Self {
        let n = model.var_count();
        let mut watchers: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut groups = Vec::new();
        for (ci, constraint) in model.constraints.iter().enumerate() {
            let mentioned: Vec<usize> = match constraint {
                CpConstraint::ExactlyOne(vars) => {
                    groups.push(ci);
                    vars.clone()
                }
                CpConstraint::AtMostOne(vars) => vars.clone(),
                CpConstraint::LinearLe { vars, .. } => vars.clone(),
                CpConstraint::Or { target, inputs } | CpConstraint::And { target, inputs } => {
                    let mut all = inputs.clone();
                    all.push(*target);
                    all
                }
            };
            for var in mentioned {
                watchers[var].push(ci);
            }
        }

        // Seeded tie-break permutation over variable ids.
        let mut rng = StdRng::seed_from_u64(seed);
        let mut perm: Vec<usize> = (0..n).collect();
        perm.shuffle(&mut rng);
        let mut rank = vec![0usize; n];
        for (i, &var) in perm.iter().enumerate() {
            rank[var] = i;
        }

        let candidate_order = groups
            .iter()
            .map(|&ci| {
                let CpConstraint::ExactlyOne(vars) = &model.constraints[ci] else {
                    unreachable!("group index always points at an exactly-one constraint");
                };
                let mut ordered = vars.clone();
                ordered.sort_by_key(|&v| (-model.weights[v], rank[v]));
                ordered
            })
            .collect();

        let open_positive = model.weights.iter().filter(|&&w| w > 0).sum();

        Self {
            model,
            values: vec![None; n],
            trail: Vec::with_capacity(n),
            watchers,
            groups,
            candidate_order,
            current_objective: 0,
            open_positive,
            best: None,
            stats: SearchStats::default(),
            deadline,
            node_counter: 0,
            timed_out: false,
            aborted: false,
        }
    }

    fn run(mut self) -> CpSolution {
        // Seed propagation: catches degenerate constraints (e.g. an empty
        // exactly-one group) before any branching.
        let mut queue = Vec::new();
        let mut feasible_root = true;
        for ci in 0..self.model.constraints.len() {
            if !self.propagate_one(ci, &mut queue) {
                feasible_root = false;
                break;
            }
        }
        if feasible_root && self.drain(&mut queue) {
            self.search();
        }

        let status = match (&self.best, self.timed_out) {
            (Some(_), false) => SolverStatus::Optimal,
            (Some(_), true) => SolverStatus::Feasible,
            (None, false) => SolverStatus::Infeasible,
            (None, true) => SolverStatus::Unknown,
        };
        let (objective, values) = self.best.unwrap_or((0, vec![false; self.model.var_count()]));
        CpSolution {
            status,
            values,
            objective,
            stats: self.stats,
        }
    }

    fn search(&mut self) {
        if self.aborted {
            return;
        }
        self.node_counter += 1;
        if self.node_counter % 64 == 0 && Instant::now() >= self.deadline {
            self.timed_out = true;
            self.aborted = true;
            return;
        }
        // Optimistic bound: everything unfixed with positive weight true.
        if let Some((best, _)) = &self.best {
            if self.current_objective + self.open_positive <= *best {
                return;
            }
        }

        if let Some(group_idx) = self.pick_open_group() {
            let candidates = self.candidate_order[group_idx].clone();
            for var in candidates {
                if self.values[var].is_some() {
                    continue;
                }
                self.stats.branches += 1;
                let mark = self.trail.len();
                if self.assign(var, true) {
                    self.search();
                } else {
                    self.stats.conflicts += 1;
                }
                self.undo_to(mark);
                if self.aborted {
                    return;
                }
            }
        } else if let Some(var) = self.first_unassigned() {
            let preferred = self.model.weights[var] > 0;
            for value in [preferred, !preferred] {
                self.stats.branches += 1;
                let mark = self.trail.len();
                if self.assign(var, value) {
                    self.search();
                } else {
                    self.stats.conflicts += 1;
                }
                self.undo_to(mark);
                if self.aborted {
                    return;
                }
            }
        } else {
            self.record_leaf();
        }
    }

    fn record_leaf(&mut self) {
        let values: Vec<bool> = self.values.iter().map(|v| v.unwrap_or(false)).collect();
        if !self.model.is_satisfied(&values) {
            self.stats.conflicts += 1;
            return;
        }
        let objective = self.current_objective;
        if self.best.as_ref().map_or(true, |(b, _)| objective > *b) {
            self.best = Some((objective, values));
        }
    }

    /// Open exactly-one group with the fewest open candidates (fail-first).
    fn pick_open_group(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (gi, &ci) in self.groups.iter().enumerate() {
            let CpConstraint::ExactlyOne(vars) = &self.model.constraints[ci] else {
                unreachable!("group index always points at an exactly-one constraint");
            };
            if vars.iter().any(|&v| self.values[v] == Some(true)) {
                continue;
            }
            let open = vars.iter().filter(|&&v| self.values[v].is_none()).count();
            if best.map_or(true, |(_, n)| open < n) {
                best = Some((gi, open));
            }
        }
        best.map(|(gi, _)| gi)
    }

    fn first_unassigned(&self) -> Option<usize> {
        self.values.iter().position(|v| v.is_none())
    }

    /// Assigns a variable and propagates to fixpoint. False on conflict.
    fn assign(&mut self, var: usize, value: bool) -> bool {
        let mut queue = Vec::new();
        self.set(var, value, &mut queue) && self.drain(&mut queue)
    }

    fn drain(&mut self, queue: &mut Vec<usize>) -> bool {
        while let Some(var) = queue.pop() {
            for i in 0..self.watchers[var].len() {
                let ci = self.watchers[var][i];
                if !self.propagate_one(ci, queue) {
                    return false;
                }
            }
        }
        true
    }

    fn set(&mut self, var: usize, value: bool, queue: &mut Vec<usize>) -> bool {
        match self.values[var] {
            Some(existing) => existing == value,
            None => {
                self.values[var] = Some(value);
                self.trail.push(var);
                let weight = self.model.weights[var];
                if value {
                    self.current_objective += weight;
                }
                if weight > 0 {
                    self.open_positive -= weight;
                }
                queue.push(var);
                true
            }
        }
    }

    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let var = self.trail.pop().expect("trail shorter than mark");
            let value = self.values[var].take().expect("trail var unassigned");
            let weight = self.model.weights[var];
            if value {
                self.current_objective -= weight;
            }
            if weight > 0 {
                self.open_positive += weight;
            }
        }
    }

    fn propagate_one(&mut self, ci: usize, queue: &mut Vec<usize>) -> bool {
        let model = self.model;
        match &model.constraints[ci] {
            CpConstraint::ExactlyOne(vars) => {
                let (true_count, unfixed) = self.tally(vars);
                if true_count > 1 {
                    return false;
                }
                if true_count == 1 {
                    return unfixed.into_iter().all(|v| self.set(v, false, queue));
                }
                match unfixed.len() {
                    0 => false,
                    1 => self.set(unfixed[0], true, queue),
                    _ => true,
                }
            }
            CpConstraint::AtMostOne(vars) => {
                let (true_count, unfixed) = self.tally(vars);
                if true_count > 1 {
                    return false;
                }
                if true_count == 1 {
                    return unfixed.into_iter().all(|v| self.set(v, false, queue));
                }
                true
            }
            CpConstraint::LinearLe { vars, bound } => {
                let (true_count, unfixed) = self.tally(vars);
                if true_count > *bound as usize {
                    return false;
                }
                if true_count == *bound as usize {
                    return unfixed.into_iter().all(|v| self.set(v, false, queue));
                }
                true
            }
            CpConstraint::Or { target, inputs } => {
                let (true_count, unfixed) = self.tally(inputs);
                let target = *target;
                if true_count > 0 {
                    if !self.set(target, true, queue) {
                        return false;
                    }
                } else if unfixed.is_empty() && !self.set(target, false, queue) {
                    return false;
                }
                match self.values[target] {
                    Some(false) => unfixed.into_iter().all(|v| self.set(v, false, queue)),
                    Some(true) if true_count == 0 => match unfixed.len() {
                        0 => false,
                        1 => self.set(unfixed[0], true, queue),
                        _ => true,
                    },
                    _ => true,
                }
            }
            CpConstraint::And { target, inputs } => {
                let false_count = inputs
                    .iter()
                    .filter(|&&v| self.values[v] == Some(false))
                    .count();
                let unfixed: Vec<usize> = inputs
                    .iter()
                    .copied()
                    .filter(|&v| self.values[v].is_none())
                    .collect();
                let target = *target;
                if false_count > 0 {
                    if !self.set(target, false, queue) {
                        return false;
                    }
                } else if unfixed.is_empty() && !self.set(target, true, queue) {
                    return false;
                }
                match self.values[target] {
                    Some(true) => unfixed.into_iter().all(|v| self.set(v, true, queue)),
                    Some(false) if false_count == 0 => match unfixed.len() {
                        0 => false,
                        1 => self.set(unfixed[0], false, queue),
                        _ => true,
                    },
                    _ => true,
                }
            }
        }
    }

    /// (true count, unfixed vars) for a constraint's variable list.
    fn tally(&self, vars: &[usize]) -> (usize, Vec<usize>) {
        let mut true_count = 0;
        let mut unfixed = Vec::new();
        for &v in vars {
            match self.values[v] {
                Some(true) => true_count += 1,
                Some(false) => {}
                None => unfixed.push(v),
            }
        }
        (true_count, unfixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::model::BoolVar;

    fn solve(model: &CpModel) -> CpSolution {
        CpSolver::new(SolverConfig::default()).solve(model)
    }

    #[test]
    fn test_picks_heaviest_candidate() {
        let mut model = CpModel::new();
        let vars: Vec<BoolVar> = (0..3).map(|_| model.new_bool_var()).collect();
        model.add_exactly_one(&vars);
        model.add_objective_term(vars[0], 10);
        model.add_objective_term(vars[1], 50);
        model.add_objective_term(vars[2], 20);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective, 50);
        assert_eq!(solution.values, vec![false, true, false]);
    }

    #[test]
    fn test_at_most_one_forces_tradeoff() {
        // Two slots sharing candidates; the shared candidate is heaviest
        // but can only serve one slot.
        let mut model = CpModel::new();
        let a1 = model.new_bool_var(); // shared in slot 1
        let b1 = model.new_bool_var();
        let a2 = model.new_bool_var(); // shared in slot 2
        let b2 = model.new_bool_var();
        model.add_exactly_one(&[a1, b1]);
        model.add_exactly_one(&[a2, b2]);
        model.add_at_most_one(&[a1, a2]);
        model.add_objective_term(a1, 100);
        model.add_objective_term(b1, 10);
        model.add_objective_term(a2, 100);
        model.add_objective_term(b2, 60);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        // a1 + b2 = 160 beats b1 + a2 = 110.
        assert_eq!(solution.objective, 160);
    }

    #[test]
    fn test_infeasible_when_slots_conflict() {
        let mut model = CpModel::new();
        let x = model.new_bool_var();
        let y = model.new_bool_var();
        model.add_exactly_one(&[x]);
        model.add_exactly_one(&[y]);
        model.add_at_most_one(&[x, y]);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_empty_exactly_one_is_infeasible() {
        let mut model = CpModel::new();
        let _ = model.new_bool_var();
        model.add_exactly_one(&[]);
        assert_eq!(solve(&model).status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_linear_cap_respected() {
        // Three slots, one candidate each, but the candidate set shares a
        // cap of 2 across slots → infeasible.
        let mut model = CpModel::new();
        let vars: Vec<BoolVar> = (0..3).map(|_| model.new_bool_var()).collect();
        for v in &vars {
            model.add_exactly_one(&[*v]);
        }
        model.add_linear_le(&vars, 2);
        assert_eq!(solve(&model).status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_and_bonus_steers_objective() {
        // Slot 1: a or b. Slot 2: c or d. Bonus when a and c are both
        // chosen outweighs individual preferences for b and d.
        let mut model = CpModel::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        let c = model.new_bool_var();
        let d = model.new_bool_var();
        model.add_exactly_one(&[a, b]);
        model.add_exactly_one(&[c, d]);
        model.add_objective_term(b, 30);
        model.add_objective_term(d, 30);
        let both = model.new_bool_var();
        model.add_and(both, &[a, c]);
        model.add_objective_term(both, 200);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective, 200);
        assert!(solution.values[a.index()]);
        assert!(solution.values[c.index()]);
        assert!(solution.values[both.index()]);
    }

    #[test]
    fn test_or_aux_tracks_membership() {
        let mut model = CpModel::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        model.add_exactly_one(&[a, b]);
        model.add_objective_term(b, 5);
        let any = model.new_bool_var();
        model.add_or(any, &[a, b]);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        // One of a/b is always true, so the aux must be true.
        assert!(solution.values[any.index()]);
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let mut model = CpModel::new();
        // All-equal weights: only the seeded tie-break orders candidates.
        let vars: Vec<BoolVar> = (0..6).map(|_| model.new_bool_var()).collect();
        model.add_exactly_one(&vars[0..3]);
        model.add_exactly_one(&vars[3..6]);
        for v in &vars {
            model.add_objective_term(*v, 10);
        }

        let config = SolverConfig::default().with_seed(42);
        let first = CpSolver::new(config.clone()).solve(&model);
        let second = CpSolver::new(config).solve(&model);
        assert_eq!(first.values, second.values);
        assert_eq!(first.objective, second.objective);
    }

    #[test]
    fn test_portfolio_matches_single_worker_objective() {
        let mut model = CpModel::new();
        let vars: Vec<BoolVar> = (0..4).map(|_| model.new_bool_var()).collect();
        model.add_exactly_one(&vars[0..2]);
        model.add_exactly_one(&vars[2..4]);
        model.add_objective_term(vars[0], 9);
        model.add_objective_term(vars[1], 4);
        model.add_objective_term(vars[3], 7);

        let single = CpSolver::new(SolverConfig::default()).solve(&model);
        let multi = CpSolver::new(SolverConfig::default().with_workers(3)).solve(&model);
        assert_eq!(single.status, SolverStatus::Optimal);
        assert_eq!(multi.status, SolverStatus::Optimal);
        assert_eq!(single.objective, multi.objective);
    }
}
