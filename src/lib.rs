//! Duty-roster generation for a weekend-operating club.
//!
//! Produces monthly weekend duty rosters: who serves in which role on
//! which day, honoring qualifications, preferences, blackout dates,
//! avoidance and pairing relationships, monthly caps, and fairness.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Member`, `Role`, `DutyPreference`,
//!   `SchedulingSnapshot`, `Schedule`
//! - **`season`**: Operating-season resolution from period expressions
//!   like "First weekend of May"
//! - **`extract`**: Snapshot extraction from a [`extract::RosterStore`]
//! - **`validation`**: Input integrity checks (duplicate IDs, dangling refs)
//! - **`solver`**: Constraint model, branch-and-bound search, and the
//!   roster formulation (the optimizing path)
//! - **`greedy`**: Legacy weighted-random scheduler (the fallback path)
//! - **`engine`**: Dual-path router with automatic fallback
//! - **`kpi`**: Roster quality metrics
//!
//! # Architecture
//!
//! The two scheduling paths share the same immutable snapshot and the
//! same eligibility rules; only the optimizing path can fail, and the
//! engine answers such failures with a greedy run over the identical
//! input. Fixed seeds make both paths reproducible.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Rossi et al. (2006), "Handbook of Constraint Programming"

pub mod engine;
pub mod error;
pub mod extract;
pub mod greedy;
pub mod kpi;
pub mod models;
pub mod season;
pub mod solver;
pub mod validation;

pub use engine::{EngineConfig, RosterEngine};
pub use error::ScheduleError;
pub use extract::{ExtractError, InMemoryStore, RosterStore, SnapshotExtractor};
pub use greedy::GreedyScheduler;
pub use kpi::RosterKpi;
pub use models::{
    Blackout, DayRoster, DutyPreference, Member, MemberPair, Role, RoleScarcity, Schedule,
    SchedulingSnapshot,
};
pub use season::{PeriodParseError, SeasonResolver, WeekendOrdinal};
pub use solver::{OptimizedRoster, SolverConfig, SolverStatus};
