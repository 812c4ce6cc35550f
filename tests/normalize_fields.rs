// tests/normalize_fields.rs
use goal_scraper::normalize::{format_date, NormalizeWarning, Normalizer};
use goal_scraper::{CanonicalGoalRecord, GoalNumber, RawGoalEvent, ScraperConfig, Venue};

fn raw(competition: &str, date: &str) -> RawGoalEvent {
    RawGoalEvent {
        competition: competition.into(),
        date: date.into(),
        venue: "H".into(),
        for_team: " Al-Nassr FC ".into(),
        opponent: "Al-Hilal".into(),
        minute: "12'".into(),
        goal_type: "Penalty".into(),
    }
}

#[test]
fn canonical_line_format() {
    let rec = CanonicalGoalRecord {
        number: GoalNumber::Official(57),
        date: "03/21/26".into(),
        venue: Venue::Home,
        team: "Al-Nassr".into(),
        opponent: "Al-Hilal".into(),
        minute: "12'".into(),
        goal_type: "Penalty".into(),
        is_official: true,
        competition: "Saudi Pro League".into(),
    };
    assert_eq!(rec.line(), "57 03/21/26 H Al-Nassr vs. Al-Hilal 12' Penalty");
}

#[test]
fn date_formats() {
    assert_eq!(format_date("21/03/26").as_deref(), Some("03/21/26"));
    assert_eq!(format_date("Mar 21, 2026").as_deref(), Some("03/21/26"));
    assert_eq!(format_date("21.03.2026").as_deref(), Some("03/21/26"));
}

#[test]
fn official_record_waits_for_number() {
    let cfg = ScraperConfig::default();
    let n = Normalizer::new(&cfg).normalize(&raw("Saudi Pro League", "21/03/26"));
    assert!(n.warnings.is_empty());
    assert!(n.record.is_official);
    assert_eq!(n.record.number, GoalNumber::Pending);
    assert_eq!(n.record.team, "Al-Nassr");
    assert_eq!(n.record.line(), "- 03/21/26 H Al-Nassr vs. Al-Hilal 12' Penalty");
}

#[test]
fn non_official_patterns_are_case_insensitive() {
    let cfg = ScraperConfig::default();
    let norm = Normalizer::new(&cfg);
    for comp in ["Club Friendlies", "PRE-SEASON tour", "testimonial match", "Amistoso"] {
        let n = norm.normalize(&raw(comp, "21/03/26"));
        assert!(!n.record.is_official, "{comp} should be non-official");
        assert!(n.record.line().starts_with("N.O "), "{comp}");
    }
    assert!(norm.is_official(""));
    assert!(norm.is_official("King Cup"));
}

#[test]
fn unparsed_date_passes_through_with_warning() {
    let cfg = ScraperConfig::default();
    let n = Normalizer::new(&cfg).normalize(&raw("Cup", "tbd"));
    assert_eq!(n.record.date, "tbd");
    assert_eq!(n.warnings, vec![NormalizeWarning::UnparsedDate("tbd".into())]);
}

#[test]
fn unknown_venue_defaults_to_neutral() {
    let cfg = ScraperConfig::default();
    let mut ev = raw("Cup", "21/03/26");
    ev.venue = "?".into();
    let n = Normalizer::new(&cfg).normalize(&ev);
    assert_eq!(n.record.venue, Venue::Neutral);
    assert_eq!(n.warnings, vec![NormalizeWarning::UnknownVenue("?".into())]);
}

#[test]
fn configured_aliases_and_goal_types_apply() {
    let mut cfg = ScraperConfig::default();
    cfg.teams.insert("Al-Hilal".into(), "Al Hilal SFC".into());
    cfg.goal_types.insert(0, goal_scraper::config::GoalTypeRule::new("pen", "Spot kick"));
    let n = Normalizer::new(&cfg).normalize(&raw("Cup", "21/03/26"));
    assert_eq!(n.record.opponent, "Al Hilal SFC");
    assert_eq!(n.record.goal_type, "Spot kick");
}
