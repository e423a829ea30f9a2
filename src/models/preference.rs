//! Per-member duty preferences.
//!
//! One optional record per member: per-role willingness percentages,
//! opt-out flags, a monthly assignment cap, and the most recent duty date
//! used for staleness-based fairness.
//!
//! # Percentage override
//!
//! A 0% entry normally means "excluded". The exception, preserved from the
//! legacy system: when *every* role the member is qualified for sits at 0%
//! (which includes the single-qualification case), all qualified roles are
//! treated as 100%. A member with no preference record therefore defaults
//! to 100% on every qualified role.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Member, Role};

/// Sentinel "never assigned" date for members with no recorded duty.
pub const FAR_PAST: NaiveDate = NaiveDate::MIN;

/// Monthly cap used when a member has no preference record.
pub const DEFAULT_MONTHLY_CAP: u32 = 8;

/// Monthly cap substituted when a record stores a cap of exactly 0.
pub const ZERO_CAP_FALLBACK: u32 = 2;

/// Days of staleness beyond which the fairness bias stops growing.
pub const STALENESS_CAP_DAYS: i64 = 365;

/// A member's scheduling preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyPreference {
    /// Willingness percentage (0–100) per role.
    percent: [u8; Role::COUNT],
    /// Member asked not to be scheduled at all.
    pub do_not_schedule: bool,
    /// Membership temporarily suspended.
    pub suspended: bool,
    /// Maximum assignments per month. 0 falls back to [`ZERO_CAP_FALLBACK`].
    pub max_per_month: u32,
    /// Date of the most recent duty, or [`FAR_PAST`] if never assigned.
    pub last_duty: NaiveDate,
}

impl Default for DutyPreference {
    fn default() -> Self {
        Self {
            percent: [0; Role::COUNT],
            do_not_schedule: false,
            suspended: false,
            max_per_month: DEFAULT_MONTHLY_CAP,
            last_duty: FAR_PAST,
        }
    }
}

impl DutyPreference {
    /// Creates an empty preference record (all percentages 0, default cap).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the willingness percentage for a role (clamped to 100).
    pub fn with_percent(mut self, role: Role, percent: u8) -> Self {
        self.percent[role.index()] = percent.min(100);
        self
    }

    /// Sets the do-not-schedule flag.
    pub fn with_do_not_schedule(mut self, flag: bool) -> Self {
        self.do_not_schedule = flag;
        self
    }

    /// Sets the suspended flag.
    pub fn with_suspended(mut self, flag: bool) -> Self {
        self.suspended = flag;
        self
    }

    /// Sets the monthly assignment cap.
    pub fn with_max_per_month(mut self, cap: u32) -> Self {
        self.max_per_month = cap;
        self
    }

    /// Sets the most recent duty date.
    pub fn with_last_duty(mut self, date: NaiveDate) -> Self {
        self.last_duty = date;
        self
    }

    /// Raw stored percentage for a role.
    #[inline]
    pub fn percent(&self, role: Role) -> u8 {
        self.percent[role.index()]
    }

    /// Whether the member may be scheduled at all.
    #[inline]
    pub fn schedulable(&self) -> bool {
        !self.do_not_schedule && !self.suspended
    }

    /// Percentage after the zero-override rule, for one role of `member`.
    ///
    /// Returns 0 for roles the member is not qualified for.
    pub fn effective_percent(&self, member: &Member, role: Role) -> u32 {
        if !member.is_qualified(role) {
            return 0;
        }
        let all_zero = Role::ALL
            .into_iter()
            .filter(|r| member.is_qualified(*r))
            .all(|r| self.percent(r) == 0);
        if all_zero {
            100
        } else {
            u32::from(self.percent(role))
        }
    }

    /// Effective monthly cap: a stored cap of 0 means the legacy model
    /// default of 2, not "unlimited" and not "none".
    #[inline]
    pub fn monthly_cap(&self) -> u32 {
        if self.max_per_month == 0 {
            ZERO_CAP_FALLBACK
        } else {
            self.max_per_month
        }
    }

    /// Days since the last recorded duty as of `as_of`, capped at
    /// [`STALENESS_CAP_DAYS`] so never-scheduled members do not dominate.
    pub fn staleness_days(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.last_duty)
            .num_days()
            .clamp(0, STALENESS_CAP_DAYS)
    }
}

/// Resolves a possibly-missing preference record to a concrete one.
///
/// Members without a record are schedulable, default-capped, and
/// never-assigned; the zero percentages then override to 100 on every
/// qualified role.
pub fn resolve_preference(pref: Option<&DutyPreference>) -> DutyPreference {
    pref.cloned().unwrap_or_default()
}
