//! Immutable scheduling snapshot.
//!
//! Everything the engines need for one run, collected once by the
//! extractor: candidate duty days, the active member roster, preference
//! records, blackout dates, avoidance and pairing sets, and per-role
//! scarcity. The engines never mutate a snapshot and never re-query the
//! underlying store mid-solve.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{DutyPreference, Member, Role};

/// A member's unavailability on a specific date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blackout {
    /// Unavailable member.
    pub member_id: String,
    /// Date the member is unavailable.
    pub date: NaiveDate,
}

impl Blackout {
    /// Creates a blackout entry.
    pub fn new(member_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            member_id: member_id.into(),
            date,
        }
    }
}

/// A canonical unordered pair of member ids.
///
/// Used for both avoidance pairs (must not share a day) and pairing pairs
/// (bonus for sharing a day). Construction sorts the two ids so that
/// `(a, b)` and `(b, a)` compare and hash identically; self-pairs are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberPair {
    first: String,
    second: String,
}

impl MemberPair {
    /// Creates a canonical pair, or `None` for a self-pair.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Option<Self> {
        let a = a.into();
        let b = b.into();
        if a == b {
            return None;
        }
        if a < b {
            Some(Self { first: a, second: b })
        } else {
            Some(Self { first: b, second: a })
        }
    }

    /// Lexicographically smaller member id.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Lexicographically larger member id.
    pub fn second(&self) -> &str {
        &self.second
    }

    /// Whether the pair involves the given member.
    pub fn involves(&self, member_id: &str) -> bool {
        self.first == member_id || self.second == member_id
    }

    /// The partner of `member_id`, if the pair involves them.
    pub fn partner_of(&self, member_id: &str) -> Option<&str> {
        if self.first == member_id {
            Some(&self.second)
        } else if self.second == member_id {
            Some(&self.first)
        } else {
            None
        }
    }
}

/// How constrained a role's candidate pool is.
///
/// Ratio of qualified, schedulable members to duty days. Used only to
/// order slot constraints so the scarcest role surfaces first in
/// infeasibility diagnostics; never affects correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleScarcity {
    /// The role.
    pub role: Role,
    /// Number of qualified, schedulable members.
    pub qualified_members: usize,
    /// `qualified_members / duty_days` (infinite pools map to a large ratio).
    pub ratio: f64,
}

/// Immutable input snapshot for one scheduling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingSnapshot {
    /// Year being scheduled.
    pub year: i32,
    /// Month being scheduled (1–12).
    pub month: u32,
    /// Eligible duty days, chronological.
    pub duty_days: Vec<NaiveDate>,
    /// Active members.
    pub members: Vec<Member>,
    /// Preference records by member id (members may be absent).
    pub preferences: HashMap<String, DutyPreference>,
    /// Blackout set.
    pub blackouts: HashSet<Blackout>,
    /// Members who must never share a duty day.
    pub avoidances: HashSet<MemberPair>,
    /// Members who gain a bonus for sharing a duty day.
    pub pairings: HashSet<MemberPair>,
    /// Per-role scarcity, scarcest first.
    pub scarcity: Vec<RoleScarcity>,
}

impl SchedulingSnapshot {
    /// Staleness anchor: the first day of the scheduled month.
    pub fn anchor_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Whether the member is blacked out on the given date.
    pub fn is_blacked_out(&self, member_id: &str, date: NaiveDate) -> bool {
        self.blackouts.contains(&Blackout {
            member_id: member_id.to_string(),
            date,
        })
    }

    /// Resolved preference for a member (defaults applied when absent).
    pub fn preference_for(&self, member_id: &str) -> DutyPreference {
        super::preference::resolve_preference(self.preferences.get(member_id))
    }

    /// Whether two members form an avoidance pair.
    pub fn must_avoid(&self, a: &str, b: &str) -> bool {
        MemberPair::new(a, b)
            .map(|p| self.avoidances.contains(&p))
            .unwrap_or(false)
    }

    /// Whether two members form a pairing pair.
    pub fn is_paired(&self, a: &str, b: &str) -> bool {
        MemberPair::new(a, b)
            .map(|p| self.pairings.contains(&p))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_member_pair_canonical() {
        let p1 = MemberPair::new("bob", "alice").unwrap();
        let p2 = MemberPair::new("alice", "bob").unwrap();
        assert_eq!(p1, p2);
        assert_eq!(p1.first(), "alice");
        assert_eq!(p1.second(), "bob");
    }

    #[test]
    fn test_member_pair_rejects_self() {
        assert!(MemberPair::new("alice", "alice").is_none());
    }

    #[test]
    fn test_member_pair_partner() {
        let p = MemberPair::new("alice", "bob").unwrap();
        assert_eq!(p.partner_of("alice"), Some("bob"));
        assert_eq!(p.partner_of("bob"), Some("alice"));
        assert_eq!(p.partner_of("carol"), None);
        assert!(p.involves("bob"));
        assert!(!p.involves("carol"));
    }

    #[test]
    fn test_snapshot_queries() {
        let mut blackouts = HashSet::new();
        blackouts.insert(Blackout::new("alice", date(1)));
        let mut avoidances = HashSet::new();
        avoidances.insert(MemberPair::new("alice", "bob").unwrap());

        let snapshot = SchedulingSnapshot {
            year: 2024,
            month: 6,
            duty_days: vec![date(1), date(2)],
            members: vec![Member::new("alice"), Member::new("bob")],
            preferences: HashMap::new(),
            blackouts,
            avoidances,
            pairings: HashSet::new(),
            scarcity: Vec::new(),
        };

        assert!(snapshot.is_blacked_out("alice", date(1)));
        assert!(!snapshot.is_blacked_out("alice", date(2)));
        assert!(snapshot.must_avoid("bob", "alice"));
        assert!(!snapshot.is_paired("alice", "bob"));
        assert_eq!(snapshot.anchor_date(), date(1));
        // No record → defaults.
        assert_eq!(snapshot.preference_for("alice").monthly_cap(), 8);
    }
}
