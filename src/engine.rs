//! Dual-path roster generation.
//!
//! The engine extracts one snapshot per run and routes it to the
//! optimizing constraint path or the legacy greedy path. The router is
//! the only place optimizer errors are caught: any [`ScheduleError`]
//! from the constraint path is logged and answered with a greedy run
//! over the very same snapshot, so callers of [`RosterEngine::generate_roster`]
//! always get a schedule when extraction itself succeeds.

use chrono::NaiveDate;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::ScheduleError;
use crate::extract::{ExtractError, RosterStore, SnapshotExtractor};
use crate::greedy::GreedyScheduler;
use crate::models::{Role, Schedule};
use crate::season::SeasonResolver;
use crate::solver::{OptimizedRoster, RosterModelBuilder, SolverConfig};

/// Engine tuning knobs.
///
/// An unconfigured engine routes to the greedy path; the optimizing
/// path has to be opted into.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Route runs through the optimizing path first.
    pub use_optimizer: bool,
    /// Solver budget and determinism settings for the optimizing path.
    pub solver: SolverConfig,
    /// Seed for the greedy path.
    pub greedy_seed: u64,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the optimizing path.
    pub fn with_optimizer(mut self, enabled: bool) -> Self {
        self.use_optimizer = enabled;
        self
    }

    /// Sets the solver configuration.
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the greedy path seed.
    pub fn with_greedy_seed(mut self, seed: u64) -> Self {
        self.greedy_seed = seed;
        self
    }
}

/// Monthly duty-roster generator over a [`RosterStore`].
pub struct RosterEngine<S> {
    extractor: SnapshotExtractor<S>,
    config: EngineConfig,
}

impl<S: RosterStore> RosterEngine<S> {
    /// Creates an engine with default configuration.
    pub fn new(store: S, season: SeasonResolver) -> Self {
        Self {
            extractor: SnapshotExtractor::new(store, season),
            config: EngineConfig::default(),
        }
    }

    /// Sets the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Access to the snapshot extractor.
    pub fn extractor(&self) -> &SnapshotExtractor<S> {
        &self.extractor
    }

    /// Generates the roster for a month, routing between the two paths.
    ///
    /// When the optimizing path is enabled and fails, the failure is
    /// logged and the greedy scheduler runs over the identical snapshot.
    ///
    /// # Errors
    ///
    /// [`ExtractError`] only, for an invalid month or a season period
    /// that does not parse; scheduling itself cannot fail on this path.
    pub fn generate_roster(
        &self,
        year: i32,
        month: u32,
        roles: &[Role],
        exclude_dates: &[NaiveDate],
    ) -> Result<Schedule, ExtractError> {
        let snapshot = self.extractor.extract(year, month, roles, exclude_dates)?;

        if self.config.use_optimizer {
            match RosterModelBuilder::new(&snapshot, roles).solve(&self.config.solver) {
                Ok(solved) => {
                    info!(
                        year,
                        month,
                        objective = solved.objective,
                        "optimizing path produced the roster"
                    );
                    return Ok(solved.schedule);
                }
                Err(err) => {
                    warn!(year, month, %err, "optimizing path failed, falling back to greedy");
                }
            }
        }

        Ok(GreedyScheduler::new()
            .with_seed(self.config.greedy_seed)
            .schedule(&snapshot, roles))
    }

    /// Generates a roster through the optimizing path only.
    ///
    /// `timeout` overrides the configured solver time budget when set.
    ///
    /// # Errors
    ///
    /// [`ScheduleError`] for extraction failures, structural
    /// infeasibility, or an unsuccessful search. Nothing is caught here;
    /// callers wanting the fallback use [`Self::generate_roster`].
    pub fn generate_roster_optimized(
        &self,
        year: i32,
        month: u32,
        roles: &[Role],
        exclude_dates: &[NaiveDate],
        timeout: Option<Duration>,
    ) -> Result<OptimizedRoster, ScheduleError> {
        let snapshot = self.extractor.extract(year, month, roles, exclude_dates)?;
        let mut solver = self.config.solver.clone();
        if let Some(budget) = timeout {
            solver = solver.with_time_budget(budget);
        }
        RosterModelBuilder::new(&snapshot, roles).solve(&solver)
    }

    /// Generates a roster through the greedy path only.
    ///
    /// # Errors
    ///
    /// [`ExtractError`] from extraction; the greedy scheduler itself
    /// is infallible.
    pub fn generate_roster_greedy(
        &self,
        year: i32,
        month: u32,
        roles: &[Role],
        exclude_dates: &[NaiveDate],
    ) -> Result<Schedule, ExtractError> {
        let snapshot = self.extractor.extract(year, month, roles, exclude_dates)?;
        Ok(GreedyScheduler::new()
            .with_seed(self.config.greedy_seed)
            .schedule(&snapshot, roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::InMemoryStore;
    use crate::models::{DutyPreference, Member};

    const ROLES: [Role; 2] = [Role::Instructor, Role::TowPilot];

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn healthy_store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        for id in ["alice", "bob", "carol", "dave"] {
            store.add_member(
                Member::new(id)
                    .with_qualification(Role::Instructor)
                    .with_qualification(Role::TowPilot),
            );
        }
        store
    }

    fn engine(store: InMemoryStore) -> RosterEngine<InMemoryStore> {
        RosterEngine::new(store, SeasonResolver::new())
    }

    fn optimizing_engine(store: InMemoryStore) -> RosterEngine<InMemoryStore> {
        engine(store).with_config(EngineConfig::new().with_optimizer(true))
    }

    #[test]
    fn test_optimizing_path_fills_everything() {
        let schedule = optimizing_engine(healthy_store())
            .generate_roster(2024, 6, &ROLES, &[])
            .unwrap();
        // 10 weekend days, 2 roles.
        assert_eq!(schedule.slot_count(), 20);
        assert_eq!(schedule.filled_count(), 20);
    }

    #[test]
    fn test_fallback_on_structural_infeasibility() {
        // Nobody is qualified as duty officer, so the optimizing path
        // fails fast and the router must still hand back a schedule.
        let roles = [Role::Instructor, Role::DutyOfficer];
        let engine = optimizing_engine(healthy_store());
        let schedule = engine.generate_roster(2024, 6, &roles, &[]).unwrap();

        assert_eq!(schedule.day_count(), 10);
        // Instructor slots fill, duty officer slots carry diagnostics.
        for day in &schedule.days {
            assert!(day.slots[&Role::Instructor].is_some());
            assert!(day.slots[&Role::DutyOfficer].is_none());
            assert!(day.diagnostics.contains_key(&Role::DutyOfficer));
        }

        // The dedicated optimizing entry point surfaces the error.
        let err = engine
            .generate_roster_optimized(2024, 6, &roles, &[], None)
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::StructuralInfeasibility {
                role: Role::DutyOfficer,
                ..
            }
        ));
    }

    #[test]
    fn test_fallback_on_solver_failure() {
        // A stored cap of 0 resolves to 2, so one tow pilot cannot cover
        // ten duty days: the search proves the model infeasible and the
        // router must substitute the greedy result.
        let mut store = InMemoryStore::new();
        store
            .add_member(Member::new("solo").with_qualification(Role::TowPilot))
            .set_preference("solo", DutyPreference::new().with_max_per_month(0));
        let roles = [Role::TowPilot];
        let engine = RosterEngine::new(store, SeasonResolver::new())
            .with_config(EngineConfig::new().with_optimizer(true));

        let err = engine
            .generate_roster_optimized(2024, 6, &roles, &[], None)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::SolverFailure { .. }));

        let routed = engine.generate_roster(2024, 6, &roles, &[]).unwrap();
        let direct = engine.generate_roster_greedy(2024, 6, &roles, &[]).unwrap();
        assert_eq!(routed.day_count(), 10);
        assert!(routed.filled_count() > 0);
        assert_eq!(
            serde_json::to_string(&routed).unwrap(),
            serde_json::to_string(&direct).unwrap()
        );
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let err = engine(healthy_store())
            .generate_roster(2024, 13, &ROLES, &[])
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::InvalidMonth {
                year: 2024,
                month: 13
            }
        ));
    }

    #[test]
    fn test_unconfigured_engine_routes_to_greedy() {
        let config = EngineConfig::new().with_greedy_seed(5);
        let engine = engine(healthy_store()).with_config(config);
        let routed = engine.generate_roster(2024, 6, &ROLES, &[]).unwrap();
        let direct = engine.generate_roster_greedy(2024, 6, &ROLES, &[]).unwrap();
        assert_eq!(
            serde_json::to_string(&routed).unwrap(),
            serde_json::to_string(&direct).unwrap()
        );
    }

    #[test]
    fn test_exclusions_shorten_schedule() {
        let engine = optimizing_engine(healthy_store());
        let excluded = [date(15), date(16), date(29)];
        let full = engine.generate_roster(2024, 6, &ROLES, &[]).unwrap();
        let trimmed = engine.generate_roster(2024, 6, &ROLES, &excluded).unwrap();
        assert_eq!(trimmed.day_count(), full.day_count() - excluded.len());
        assert!(trimmed.days.iter().all(|d| !excluded.contains(&d.date)));
    }

    #[test]
    fn test_invalid_season_is_not_caught_by_router() {
        let season = SeasonResolver::new().with_start("someday in May");
        let engine = RosterEngine::new(healthy_store(), season);
        assert!(engine.generate_roster(2024, 6, &ROLES, &[]).is_err());
    }

    #[test]
    fn test_timeout_override_still_solves_small_models() {
        let engine = engine(healthy_store());
        let solved = engine
            .generate_roster_optimized(2024, 6, &ROLES, &[], Some(Duration::from_secs(2)))
            .unwrap();
        assert_eq!(solved.schedule.filled_count(), 20);
    }
}
