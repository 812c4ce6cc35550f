// src/normalize.rs
//! Raw scraped goal -> canonical record, and the canonical one-line format:
//! `<number> <MM/DD/YY> <H|A|N> <team> vs. <opponent> <minute> <goal type>`

use chrono::{Month, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{GoalTypeRule, ScraperConfig, DEFAULT_GOAL_TYPE};
use crate::scrape::types::RawGoalEvent;

pub const NON_OFFICIAL_MARKER: &str = "N.O";

static RE_DD_MM_YY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2})/(\d{2})/(\d{2})\b").expect("dd/mm/yy regex"));
static RE_MONTH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z]+)\s+(\d{1,2}),?\s+(\d{4})").expect("month-name date regex")
});
static RE_NUMERIC_FULL_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})").expect("numeric date regex")
});
static RE_PERSON_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z]+\s+[A-Z]").expect("person name regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Venue {
    Home,
    Away,
    Neutral,
}

impl Venue {
    pub fn code(self) -> &'static str {
        match self {
            Venue::Home => "H",
            Venue::Away => "A",
            Venue::Neutral => "N",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Official goals are numbered once the whole batch is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalNumber {
    Pending,
    Official(u32),
    NonOfficial,
}

impl fmt::Display for GoalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalNumber::Pending => f.write_str("-"),
            GoalNumber::Official(n) => write!(f, "{n}"),
            GoalNumber::NonOfficial => f.write_str(NON_OFFICIAL_MARKER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalGoalRecord {
    pub number: GoalNumber,
    pub date: String, // MM/DD/YY
    pub venue: Venue,
    pub team: String,
    pub opponent: String,
    pub minute: String, // digits, optional '+', trailing apostrophe
    pub goal_type: String,
    pub is_official: bool,
    pub competition: String,
}

impl CanonicalGoalRecord {
    /// The persisted form of this record.
    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CanonicalGoalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} vs. {} {} {}",
            self.number,
            self.date,
            self.venue,
            self.team,
            self.opponent,
            self.minute,
            self.goal_type
        )
    }
}

/// A value that matched no known format; a default or the raw text was used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeWarning {
    UnparsedDate(String),
    UnknownVenue(String),
    UnmappedGoalType(String),
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeWarning::UnparsedDate(s) => write!(f, "could not parse date: {s}"),
            NormalizeWarning::UnknownVenue(s) => write!(f, "unknown venue {s:?}, using N"),
            NormalizeWarning::UnmappedGoalType(s) => write!(f, "unmapped goal type {s:?} kept as-is"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub record: CanonicalGoalRecord,
    pub warnings: Vec<NormalizeWarning>,
}

pub struct Normalizer<'a> {
    non_official: Vec<String>,
    teams: &'a BTreeMap<String, String>,
    goal_types: Vec<GoalTypeRule>,
}

impl<'a> Normalizer<'a> {
    pub fn new(cfg: &'a ScraperConfig) -> Self {
        Self {
            non_official: cfg
                .classify
                .non_official
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            teams: &cfg.teams,
            goal_types: cfg
                .goal_types
                .iter()
                .filter(|r| !r.keyword.trim().is_empty())
                .map(|r| GoalTypeRule::new(&r.keyword.trim().to_lowercase(), &r.label))
                .collect(),
        }
    }

    pub fn normalize(&self, raw: &RawGoalEvent) -> Normalized {
        let mut warnings = Vec::new();

        let is_official = self.is_official(&raw.competition);

        let date = match format_date(&raw.date) {
            Some(d) => d,
            None if raw.date.is_empty() => String::new(),
            None => {
                warnings.push(NormalizeWarning::UnparsedDate(raw.date.clone()));
                raw.date.clone()
            }
        };

        let venue = match parse_venue(&raw.venue) {
            Some(v) => v,
            None => {
                if !raw.venue.trim().is_empty() {
                    warnings.push(NormalizeWarning::UnknownVenue(raw.venue.clone()));
                }
                Venue::Neutral
            }
        };

        let (goal_type, mapped) = normalize_goal_type(&raw.goal_type, &self.goal_types);
        if !mapped {
            warnings.push(NormalizeWarning::UnmappedGoalType(goal_type.clone()));
        }

        let record = CanonicalGoalRecord {
            number: if is_official {
                GoalNumber::Pending
            } else {
                GoalNumber::NonOfficial
            },
            date,
            venue,
            team: normalize_team(&raw.for_team, self.teams),
            opponent: normalize_team(&raw.opponent, self.teams),
            minute: normalize_minute(&raw.minute),
            goal_type,
            is_official,
            competition: raw.competition.clone(),
        };

        for w in &warnings {
            tracing::warn!(target: "normalize", line = %record, "{w}");
        }

        Normalized { record, warnings }
    }

    pub fn is_official(&self, competition: &str) -> bool {
        let lower = competition.to_lowercase();
        !self.non_official.iter().any(|p| lower.contains(p.as_str()))
    }
}

/// Source date (DD/MM/YY, "Month D, YYYY" or D.M.YYYY with `.`, `/` or `-`) -> MM/DD/YY.
/// `None` when nothing matched.
pub fn format_date(s: &str) -> Option<String> {
    if let Some(c) = RE_DD_MM_YY.captures(s) {
        return Some(format!("{}/{}/{}", &c[2], &c[1], &c[3]));
    }

    let parsed = RE_MONTH_NAME
        .captures(s)
        .and_then(|c| {
            let month = c[1].parse::<Month>().ok()?;
            let day = c[2].parse().ok()?;
            let year = c[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month.number_from_month(), day)
        })
        .or_else(|| {
            let c = RE_NUMERIC_FULL_YEAR.captures(s)?;
            NaiveDate::from_ymd_opt(c[3].parse().ok()?, c[2].parse().ok()?, c[1].parse().ok()?)
        })?;

    Some(parsed.format("%m/%d/%y").to_string())
}

/// Canonical MM/DD/YY -> calendar date. Years above 50 are 19xx.
pub fn parse_canonical_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('/');
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let yy: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let year = if yy > 50 { 1900 + yy } else { 2000 + yy };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `None` for anything that is not a recognisable venue marker.
pub fn parse_venue(s: &str) -> Option<Venue> {
    let v = s.trim().to_lowercase();
    match v.as_str() {
        "h" | "home" => return Some(Venue::Home),
        "a" | "away" => return Some(Venue::Away),
        "n" | "neutral" => return Some(Venue::Neutral),
        _ => {}
    }
    if v.contains("home") || v.contains("(h)") {
        Some(Venue::Home)
    } else if v.contains("away") || v.contains("(a)") {
        Some(Venue::Away)
    } else {
        None
    }
}

pub fn normalize_team(name: &str, aliases: &BTreeMap<String, String>) -> String {
    let trimmed = name.trim();
    aliases
        .get(trimmed)
        .cloned()
        .unwrap_or_else(|| trimmed.to_string())
}

/// Keep digits, `+` and apostrophes; guarantee a trailing apostrophe.
pub fn normalize_minute(minute: &str) -> String {
    if minute.is_empty() {
        return String::new();
    }
    let mut cleaned: String = minute
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+' || *c == '\'')
        .collect();
    if !cleaned.ends_with('\'') {
        cleaned.push('\'');
    }
    cleaned
}

/// Map free-form type text to a label. The flag is false when the text was
/// passed through unrecognised.
pub fn normalize_goal_type(raw: &str, rules: &[GoalTypeRule]) -> (String, bool) {
    if raw.is_empty() {
        return (DEFAULT_GOAL_TYPE.to_string(), true);
    }
    let lower = raw.to_lowercase();

    if let Some(rule) = rules.iter().find(|r| lower.contains(r.keyword.as_str())) {
        return (rule.label.clone(), true);
    }

    let fallback = if lower.contains("left") {
        Some("Left-footed shot")
    } else if lower.contains("right") {
        Some("Right-footed shot")
    } else if lower.contains("head") {
        Some("Header")
    } else if lower.contains("counter") {
        Some("Counter attack goal")
    } else if lower.contains("penalty") || lower.contains("pen") {
        Some("Penalty")
    } else if lower.contains("free kick") || lower.contains("freekick") {
        Some("Direct free kick")
    } else if RE_PERSON_NAME.is_match(raw) || raw.contains('í') || raw.contains('ć') {
        // an assist provider's name landed in the type column
        Some(DEFAULT_GOAL_TYPE)
    } else if lower.contains("not reported") {
        Some(DEFAULT_GOAL_TYPE)
    } else {
        None
    };
    if let Some(label) = fallback {
        return (label.to_string(), true);
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        (DEFAULT_GOAL_TYPE.to_string(), true)
    } else {
        (trimmed.to_string(), false)
    }
}

/// Newest first; undated records sink to the bottom. Stable.
pub fn sort_newest_first(records: &mut [CanonicalGoalRecord]) {
    records.sort_by(|a, b| parse_canonical_date(&b.date).cmp(&parse_canonical_date(&a.date)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_goal_types;

    #[test]
    fn two_digit_year_pivot() {
        assert_eq!(
            parse_canonical_date("03/21/26"),
            NaiveDate::from_ymd_opt(2026, 3, 21)
        );
        assert_eq!(
            parse_canonical_date("12/31/99"),
            NaiveDate::from_ymd_opt(1999, 12, 31)
        );
        assert_eq!(parse_canonical_date("21/03"), None);
        assert_eq!(parse_canonical_date("02/30/26"), None);
    }

    #[test]
    fn full_year_numeric_is_not_read_as_short_year() {
        assert_eq!(format_date("21/03/2026").as_deref(), Some("03/21/26"));
        assert_eq!(format_date("5-1-2025").as_deref(), Some("01/05/25"));
    }

    #[test]
    fn full_month_names_parse() {
        assert_eq!(format_date("January 5, 2026").as_deref(), Some("01/05/26"));
        assert_eq!(format_date("sometime").as_deref(), None);
    }

    #[test]
    fn mixed_case_keywords_match_without_sanitize() {
        let mut cfg = ScraperConfig::default();
        cfg.goal_types = vec![GoalTypeRule::new("Volley", "Volley"), GoalTypeRule::new(" Bicycle ", "Bicycle kick")];
        let norm = Normalizer::new(&cfg);
        let ev = RawGoalEvent {
            date: "21/03/26".into(),
            venue: "H".into(),
            minute: "9'".into(),
            goal_type: "Bicycle kick from the edge".into(),
            ..RawGoalEvent::default()
        };
        let n = norm.normalize(&ev);
        assert_eq!(n.record.goal_type, "Bicycle kick");
        assert!(n.warnings.is_empty());
    }

    #[test]
    fn venue_substrings() {
        assert_eq!(parse_venue(" Home "), Some(Venue::Home));
        assert_eq!(parse_venue("Al-Nassr (A)"), Some(Venue::Away));
        assert_eq!(parse_venue("x"), None);
        assert_eq!(parse_venue(""), None);
    }

    #[test]
    fn minute_cleanup() {
        assert_eq!(normalize_minute("45+2'"), "45+2'");
        assert_eq!(normalize_minute(" 90. min"), "90'");
        assert_eq!(normalize_minute(""), "");
    }

    #[test]
    fn goal_type_rules_before_fallbacks() {
        let rules = default_goal_types();
        assert_eq!(normalize_goal_type("Left-footed shot", &rules).0, "Left-footed shot");
        assert_eq!(normalize_goal_type("Penalty", &rules).0, "Penalty");
        assert_eq!(normalize_goal_type("Header", &rules).0, "Header");
        assert_eq!(normalize_goal_type("Direct free kick", &rules).0, "Direct free kick");
        assert_eq!(normalize_goal_type("Sadio Mané", &rules).0, DEFAULT_GOAL_TYPE);
        assert_eq!(normalize_goal_type("Not reported", &rules).0, DEFAULT_GOAL_TYPE);
        assert_eq!(normalize_goal_type("", &rules).0, DEFAULT_GOAL_TYPE);
        assert_eq!(normalize_goal_type("  ", &rules).0, DEFAULT_GOAL_TYPE);
        assert_eq!(
            normalize_goal_type(" Volley ", &rules),
            ("Volley".to_string(), false)
        );
    }
}
