// src/reconcile.rs
//! Dedup against the persisted lines and number the goals that are new.
//!
//! A goal is identified by `(date, venue, minute)`. Team spelling and type text
//! drift between scrapes, the triple does not.

use std::cmp::Ordering;
use std::collections::HashSet;

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{parse_canonical_date, CanonicalGoalRecord, GoalNumber};

static RE_MINUTE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?\d[\d+]*'$").expect("minute token regex"));

/// Lowercase and keep ASCII letters and digits only: `45+2'` -> `452`.
pub fn normalize_for_comparison(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

pub fn identity_key(date: &str, venue: &str, minute: &str) -> String {
    format!("{date}_{venue}_{}", normalize_for_comparison(minute))
}

/// Fields of a persisted line needed for dedup and numbering. Everything else
/// in the line stays opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedKey<'a> {
    pub number: &'a str,
    pub date: &'a str,
    pub venue: &'a str,
    pub minute: &'a str,
}

impl<'a> PersistedKey<'a> {
    pub fn parse(line: &'a str) -> Self {
        let mut parts = line.split(' ');
        let number = parts.next().unwrap_or_default();
        let date = parts.next().unwrap_or_default();
        let venue = parts.next().unwrap_or_default();
        // Team names may carry apostrophes too ("Newell's"); prefer a
        // minute-shaped token, then the last apostrophe token.
        let minute = line
            .split(' ')
            .find(|p| RE_MINUTE_TOKEN.is_match(p))
            .or_else(|| line.split(' ').filter(|p| p.contains('\'')).last())
            .unwrap_or_default();
        Self {
            number,
            date,
            venue,
            minute,
        }
    }

    pub fn identity(&self) -> String {
        identity_key(self.date, self.venue, self.minute)
    }

    /// Official number, if the line carries one (`N.O` lines do not).
    pub fn official_number(&self) -> Option<u32> {
        leading_int(self.number)
    }
}

fn leading_int(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

pub fn record_identity(r: &CanonicalGoalRecord) -> String {
    identity_key(&r.date, r.venue.code(), &r.minute)
}

/// Records whose identity is absent from `existing`, in input order.
pub fn find_new<S: AsRef<str>>(
    incoming: Vec<CanonicalGoalRecord>,
    existing: &[S],
) -> Vec<CanonicalGoalRecord> {
    let known: HashSet<String> = existing
        .iter()
        .map(|l| PersistedKey::parse(l.as_ref()).identity())
        .collect();

    let fresh: Vec<_> = incoming
        .into_iter()
        .filter(|r| !known.contains(&record_identity(r)))
        .collect();

    counter!("reconcile_new_total").increment(fresh.len() as u64);
    fresh
}

/// Highest official number among the persisted lines, 0 when there is none.
pub fn highest_number<S: AsRef<str>>(existing: &[S]) -> u32 {
    existing
        .iter()
        .filter_map(|l| PersistedKey::parse(l.as_ref()).official_number())
        .max()
        .unwrap_or(0)
}

/// Leading digits of a minute (`45+2'` -> 45), 0 when there are none.
pub fn minute_value(minute: &str) -> u32 {
    leading_int(minute.trim_start_matches('+')).unwrap_or(0)
}

fn chronological(a: &CanonicalGoalRecord, b: &CanonicalGoalRecord) -> Ordering {
    parse_canonical_date(&a.date)
        .cmp(&parse_canonical_date(&b.date))
        .then_with(|| minute_value(&a.minute).cmp(&minute_value(&b.minute)))
}

/// Number official records oldest-first starting after `highest`; non-official
/// records get `N.O`. Returns the batch newest-first.
pub fn assign_numbers(mut batch: Vec<CanonicalGoalRecord>, highest: u32) -> Vec<CanonicalGoalRecord> {
    batch.sort_by(chronological);

    let mut next = highest.saturating_add(1);
    if highest == u32::MAX {
        tracing::warn!(target: "reconcile", highest, "goal numbers exhausted, new goals reuse the last number");
    }
    for r in &mut batch {
        if r.is_official {
            r.number = GoalNumber::Official(next);
            next = next.saturating_add(1);
        } else {
            r.number = GoalNumber::NonOfficial;
        }
    }

    batch.reverse();
    batch
}
