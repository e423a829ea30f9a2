//! Scheduling error taxonomy.
//!
//! Only the optimizing path produces these; the greedy path degrades to
//! unfilled slots instead. Neither error is retried by the optimizing
//! engine itself — the dual-path router is the single place that catches
//! them and substitutes the greedy scheduler.

use chrono::NaiveDate;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::models::Role;
use crate::solver::{SearchStats, SolverStatus};

/// Failure of the optimizing scheduling path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// A slot has zero eligible candidates. Detected before any search
    /// starts, naming the offending role and day.
    #[error("no eligible members for role '{role}' on {date}")]
    StructuralInfeasibility {
        /// Role of the empty slot.
        role: Role,
        /// Day of the empty slot.
        date: NaiveDate,
    },

    /// Search completed without a usable solution.
    #[error("solver finished with status {status:?} ({stats:?})")]
    SolverFailure {
        /// Final solver status (infeasible or unknown).
        status: SolverStatus,
        /// Search effort counters for diagnostics.
        stats: SearchStats,
    },

    /// Snapshot extraction failed before any scheduling could start.
    /// Extraction errors are never caught by the fallback router: the
    /// greedy path would fail extraction the same way.
    #[error(transparent)]
    Extraction(#[from] ExtractError),
}
