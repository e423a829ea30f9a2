//! Operational calendar resolution.
//!
//! Parses recurring-period expressions like `"First weekend of May"` or
//! `"last weekend in October"` into concrete weekend dates, and decides
//! whether a date falls inside the configured operational season.
//!
//! # Resolution rules
//!
//! For an nth weekend (1–4): take the Monday-aligned week containing the
//! 1st of the month, advance `n - 1` whole weeks, and use that week's
//! Saturday and Sunday. The first weekend may therefore start in the
//! previous calendar month. For the last weekend: take the month's final
//! day and walk back to the most recent Saturday.
//!
//! Resolved boundaries are memoized per resolver instance, since the same
//! (period, year) pair is queried for every date filtered during a roster
//! run. [`SeasonResolver::invalidate`] must be called whenever the season
//! configuration changes.

use chrono::{Datelike, Days, Months, NaiveDate};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Accepted period grammar, quoted in parse errors.
const ACCEPTED_FORMATS: &str =
    "'<first|second|third|fourth|last> weekend <of|in> <month>' (ordinals may be numeric: 1st, 2nd, ...)";

/// Malformed period expression. Always recoverable by re-prompting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse period '{input}': {reason}; accepted formats: {ACCEPTED_FORMATS}")]
pub struct PeriodParseError {
    /// The offending input text.
    pub input: String,
    /// What was missing or unrecognized.
    pub reason: String,
}

impl PeriodParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Which weekend of the month a period expression names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekendOrdinal {
    /// The nth weekend, 1–4.
    Nth(u8),
    /// The last weekend of the month.
    Last,
}

/// Parses a period expression into (ordinal, month 1–12).
///
/// The literal token `weekend` is required. Ordinal and month may appear
/// in either order once the connecting words `of`/`in` are stripped;
/// matching is case-insensitive and accepts full month names or standard
/// abbreviations.
pub fn parse_period(text: &str) -> Result<(WeekendOrdinal, u32), PeriodParseError> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .filter(|t| *t != "of" && *t != "in" && *t != "the")
        .collect();

    if !tokens.iter().any(|t| *t == "weekend") {
        return Err(PeriodParseError::new(text, "missing the word 'weekend'"));
    }

    let mut ordinal = None;
    let mut month = None;
    for token in &tokens {
        if ordinal.is_none() {
            ordinal = parse_ordinal(token);
            if ordinal.is_some() {
                continue;
            }
        }
        if month.is_none() {
            month = parse_month(token);
        }
    }

    let ordinal =
        ordinal.ok_or_else(|| PeriodParseError::new(text, "no ordinal (first..fourth or last)"))?;
    let month = month.ok_or_else(|| PeriodParseError::new(text, "no month name"))?;
    Ok((ordinal, month))
}

fn parse_ordinal(token: &str) -> Option<WeekendOrdinal> {
    // Numeric forms carry the suffix; a bare digit is not an ordinal.
    match token {
        "first" | "1st" => Some(WeekendOrdinal::Nth(1)),
        "second" | "2nd" => Some(WeekendOrdinal::Nth(2)),
        "third" | "3rd" => Some(WeekendOrdinal::Nth(3)),
        "fourth" | "4th" => Some(WeekendOrdinal::Nth(4)),
        "last" => Some(WeekendOrdinal::Last),
        _ => None,
    }
}

fn parse_month(token: &str) -> Option<u32> {
    let month = match token {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Resolves a period expression to concrete (Saturday, Sunday) dates
/// for the given year.
pub fn resolve_weekend(
    year: i32,
    period: &str,
) -> Result<(NaiveDate, NaiveDate), PeriodParseError> {
    let (ordinal, month) = parse_period(period)?;
    let saturday = match ordinal {
        WeekendOrdinal::Nth(n) => {
            let first = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| PeriodParseError::new(period, format!("invalid year {year}")))?;
            let monday = first - Days::new(u64::from(first.weekday().num_days_from_monday()));
            monday + Days::new(5 + 7 * (u64::from(n) - 1))
        }
        WeekendOrdinal::Last => {
            let first = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| PeriodParseError::new(period, format!("invalid year {year}")))?;
            let last_day = first + Months::new(1) - Days::new(1);
            let back = (last_day.weekday().num_days_from_monday() + 2) % 7;
            last_day - Days::new(u64::from(back))
        }
    };
    Ok((saturday, saturday + Days::new(1)))
}

/// Operational-season resolver with a per-instance memo cache.
///
/// Callers own one instance and pass it by reference; there is no module
/// state. Scheduling runs only read resolved boundaries, so a plain map
/// behind a mutex suffices.
#[derive(Debug, Default)]
pub struct SeasonResolver {
    start_period: Option<String>,
    end_period: Option<String>,
    cache: Mutex<HashMap<(i32, String), (NaiveDate, NaiveDate)>>,
}

impl SeasonResolver {
    /// Creates a resolver with no season boundaries (every date in season).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both season boundary expressions.
    pub fn with_season(
        mut self,
        start_period: impl Into<String>,
        end_period: impl Into<String>,
    ) -> Self {
        self.start_period = Some(start_period.into());
        self.end_period = Some(end_period.into());
        self
    }

    /// Sets only the season start expression.
    pub fn with_start(mut self, start_period: impl Into<String>) -> Self {
        self.start_period = Some(start_period.into());
        self
    }

    /// Sets only the season end expression.
    pub fn with_end(mut self, end_period: impl Into<String>) -> Self {
        self.end_period = Some(end_period.into());
        self
    }

    /// Replaces the season configuration and drops all memoized entries.
    pub fn set_season(&mut self, start_period: Option<String>, end_period: Option<String>) {
        self.start_period = start_period;
        self.end_period = end_period;
        self.invalidate();
    }

    /// Clears the memo cache. Required after any configuration change.
    pub fn invalidate(&self) {
        self.cache.lock().expect("season cache poisoned").clear();
    }

    /// Whether the date lies within the operational season.
    ///
    /// Inclusive on both ends. A missing boundary leaves that side
    /// unbounded; with no boundaries configured every date is in season.
    pub fn is_in_season(&self, date: NaiveDate) -> Result<bool, PeriodParseError> {
        let year = date.year();
        if let Some(period) = &self.start_period {
            let (sat, sun) = self.resolve_cached(year, period)?;
            if date < sat.min(sun) {
                return Ok(false);
            }
        }
        if let Some(period) = &self.end_period {
            let (sat, sun) = self.resolve_cached(year, period)?;
            if date > sat.max(sun) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn resolve_cached(
        &self,
        year: i32,
        period: &str,
    ) -> Result<(NaiveDate, NaiveDate), PeriodParseError> {
        let key = (year, period.to_string());
        {
            let cache = self.cache.lock().expect("season cache poisoned");
            if let Some(found) = cache.get(&key) {
                return Ok(*found);
            }
        }
        let resolved = resolve_weekend(year, period)?;
        self.cache
            .lock()
            .expect("season cache poisoned")
            .insert(key, resolved);
        Ok(resolved)
    }
}
