//! Constraint-based optimizing scheduler.
//!
//! Three layers:
//!
//! - [`model`]: a sparse 0/1 constraint model (variables, constraint
//!   groups, weighted objective),
//! - [`search`]: a deterministic branch-and-bound search over that model
//!   with unit propagation and an optional multi-worker portfolio,
//! - [`roster`]: the duty-roster formulation that maps a
//!   [`crate::models::SchedulingSnapshot`] onto the model and decodes
//!   solutions back into a [`crate::models::Schedule`].
//!
//! The split keeps the roster semantics out of the search: the search
//! layer knows nothing about members, roles, or dates.

pub mod model;
pub mod roster;
pub mod search;

pub use model::{BoolVar, CpModel};
pub use roster::{OptimizedRoster, RosterModelBuilder, PAIRING_BONUS};
pub use search::{CpSolution, CpSolver, SearchStats, SolverConfig, SolverStatus};
