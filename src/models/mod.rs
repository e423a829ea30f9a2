//! Duty-roster domain models.
//!
//! Core data types for the scheduling engine: members and their role
//! qualifications, per-member preferences, the immutable input snapshot,
//! and the schedule output artifact.

mod member;
mod preference;
mod role;
mod schedule;
mod snapshot;

pub use member::Member;
pub use preference::{
    resolve_preference, DutyPreference, DEFAULT_MONTHLY_CAP, FAR_PAST, STALENESS_CAP_DAYS,
    ZERO_CAP_FALLBACK,
};
pub use role::Role;
pub use schedule::{DayRoster, Schedule};
pub use snapshot::{Blackout, MemberPair, RoleScarcity, SchedulingSnapshot};
