//! Scheduling data extraction.
//!
//! Pulls everything one scheduling run needs out of a [`RosterStore`]
//! and freezes it into a [`SchedulingSnapshot`]: the eligible weekend
//! duty days for the month (season- and exclusion-filtered), the active
//! member roster, preference records, blackout dates, canonicalized
//! avoidance and pairing sets, and per-role scarcity. Both engines run
//! from the snapshot alone and never touch the store mid-solve.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use thiserror::Error;
use tracing::debug;

use crate::models::{
    Blackout, DutyPreference, Member, MemberPair, Role, RoleScarcity, SchedulingSnapshot,
};
use crate::season::{PeriodParseError, SeasonResolver};

/// Failure to assemble a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The requested scheduling month does not exist on the calendar.
    #[error("invalid scheduling month {month} in year {year}")]
    InvalidMonth {
        /// Requested year.
        year: i32,
        /// Requested month (valid values are 1–12).
        month: u32,
    },

    /// A configured season period string does not parse.
    #[error(transparent)]
    InvalidSeason(#[from] PeriodParseError),
}

/// Source of roster data.
///
/// The store is read-only from the extractor's point of view; each
/// accessor returns an owned copy of the current state.
pub trait RosterStore {
    /// All members, active or not.
    fn members(&self) -> Vec<Member>;
    /// Preference records by member id. Members may have no record.
    fn preferences(&self) -> HashMap<String, DutyPreference>;
    /// Member unavailability dates.
    fn blackouts(&self) -> Vec<Blackout>;
    /// Pairs of member ids that must never share a duty day.
    fn avoidances(&self) -> Vec<(String, String)>;
    /// Pairs of member ids that prefer to share duty days.
    fn pairings(&self) -> Vec<(String, String)>;
}

/// Builds immutable snapshots from a store and a season definition.
pub struct SnapshotExtractor<S> {
    store: S,
    season: SeasonResolver,
}

impl<S: RosterStore> SnapshotExtractor<S> {
    /// Creates an extractor over a store with the given season bounds.
    pub fn new(store: S, season: SeasonResolver) -> Self {
        Self { store, season }
    }

    /// Access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The season resolver in use.
    pub fn season(&self) -> &SeasonResolver {
        &self.season
    }

    /// Extracts a snapshot for one month.
    ///
    /// Duty days are the month's Saturdays and Sundays that fall inside
    /// the operating season, minus `exclude_dates`, in chronological
    /// order. `roles` drives the scarcity summary only; the snapshot
    /// itself is role-agnostic.
    ///
    /// # Errors
    ///
    /// [`ExtractError::InvalidMonth`] when (year, month) is not a real
    /// calendar month, or [`ExtractError::InvalidSeason`] when a
    /// configured season period string does not parse.
    pub fn extract(
        &self,
        year: i32,
        month: u32,
        roles: &[Role],
        exclude_dates: &[NaiveDate],
    ) -> Result<SchedulingSnapshot, ExtractError> {
        let excluded: HashSet<NaiveDate> = exclude_dates.iter().copied().collect();
        let duty_days = self.duty_days(year, month, &excluded)?;

        let members: Vec<Member> = self
            .store
            .members()
            .into_iter()
            .filter(|m| m.active)
            .collect();
        let known: HashSet<&str> = members.iter().map(|m| m.id.as_str()).collect();

        let preferences = self.store.preferences();

        let blackouts: HashSet<Blackout> = self
            .store
            .blackouts()
            .into_iter()
            .filter(|b| known.contains(b.member_id.as_str()))
            .collect();

        let avoidances = canonical_pairs(self.store.avoidances(), &known);
        let pairings = canonical_pairs(self.store.pairings(), &known);

        let scarcity = role_scarcity(roles, &members, &preferences, duty_days.len());

        debug!(
            year,
            month,
            days = duty_days.len(),
            members = members.len(),
            "snapshot extracted"
        );

        Ok(SchedulingSnapshot {
            year,
            month,
            duty_days,
            members,
            preferences,
            blackouts,
            avoidances,
            pairings,
            scarcity,
        })
    }

    fn duty_days(
        &self,
        year: i32,
        month: u32,
        excluded: &HashSet<NaiveDate>,
    ) -> Result<Vec<NaiveDate>, ExtractError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(ExtractError::InvalidMonth { year, month })?;
        let next_month = first + Months::new(1);

        let mut days = Vec::new();
        let mut date = first;
        while date < next_month {
            let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            if weekend && !excluded.contains(&date) && self.season.is_in_season(date)? {
                days.push(date);
            }
            date = date + Days::new(1);
        }
        Ok(days)
    }
}

/// Canonicalizes raw id pairs, dropping self-pairs and pairs that
/// reference members outside the active roster.
fn canonical_pairs(raw: Vec<(String, String)>, known: &HashSet<&str>) -> HashSet<MemberPair> {
    raw.into_iter()
        .filter(|(a, b)| known.contains(a.as_str()) && known.contains(b.as_str()))
        .filter_map(|(a, b)| MemberPair::new(a, b))
        .collect()
}

/// Qualified-and-schedulable pool size per role, scarcest first.
fn role_scarcity(
    roles: &[Role],
    members: &[Member],
    preferences: &HashMap<String, DutyPreference>,
    duty_days: usize,
) -> Vec<RoleScarcity> {
    let mut scarcity: Vec<RoleScarcity> = roles
        .iter()
        .map(|&role| {
            let qualified_members = members
                .iter()
                .filter(|m| {
                    let pref = crate::models::resolve_preference(preferences.get(&m.id));
                    pref.schedulable() && pref.effective_percent(m, role) > 0
                })
                .count();
            let ratio = qualified_members as f64 / duty_days.max(1) as f64;
            RoleScarcity {
                role,
                qualified_members,
                ratio,
            }
        })
        .collect();
    scarcity.sort_by(|a, b| {
        a.ratio
            .partial_cmp(&b.ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scarcity
}

/// An in-memory [`RosterStore`], suitable for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    members: Vec<Member>,
    preferences: HashMap<String, DutyPreference>,
    blackouts: Vec<Blackout>,
    avoidances: Vec<(String, String)>,
    pairings: Vec<(String, String)>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member.
    pub fn add_member(&mut self, member: Member) -> &mut Self {
        self.members.push(member);
        self
    }

    /// Sets a member's preference record.
    pub fn set_preference(
        &mut self,
        member_id: impl Into<String>,
        pref: DutyPreference,
    ) -> &mut Self {
        self.preferences.insert(member_id.into(), pref);
        self
    }

    /// Records a blackout date for a member.
    pub fn add_blackout(&mut self, member_id: impl Into<String>, date: NaiveDate) -> &mut Self {
        self.blackouts.push(Blackout::new(member_id, date));
        self
    }

    /// Records an avoidance pair.
    pub fn add_avoidance(&mut self, a: impl Into<String>, b: impl Into<String>) -> &mut Self {
        self.avoidances.push((a.into(), b.into()));
        self
    }

    /// Records a pairing pair.
    pub fn add_pairing(&mut self, a: impl Into<String>, b: impl Into<String>) -> &mut Self {
        self.pairings.push((a.into(), b.into()));
        self
    }
}

impl RosterStore for InMemoryStore {
    fn members(&self) -> Vec<Member> {
        self.members.clone()
    }

    fn preferences(&self) -> HashMap<String, DutyPreference> {
        self.preferences.clone()
    }

    fn blackouts(&self) -> Vec<Blackout> {
        self.blackouts.clone()
    }

    fn avoidances(&self) -> Vec<(String, String)> {
        self.avoidances.clone()
    }

    fn pairings(&self) -> Vec<(String, String)> {
        self.pairings.clone()
    }
}
