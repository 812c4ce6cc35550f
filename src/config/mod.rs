// src/config/mod.rs
//! Static run configuration: source page, persisted artifact, selector fallbacks,
//! officiality patterns, team aliases and the goal-type keyword table.

pub mod load;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub use load::{load, load_default, load_from};

pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_GOAL_TYPE: &str = "Right-footed shot";

const DEFAULT_URL: &str = "https://www.transfermarkt.com/cristiano-ronaldo/alletore/spieler/8198/saison/2025/verein/0/liga/0/wettbewerb//pos/0/trainer_id/0/minute/0/torart/0/plus/1";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub source: SourceConfig,
    pub artifact: ArtifactConfig,
    pub selectors: SelectorConfig,
    pub classify: ClassifyConfig,
    /// Exact (trimmed) scraped team name -> canonical name.
    pub teams: BTreeMap<String, String>,
    /// Checked in order; first keyword found in the lowercased type text wins.
    pub goal_types: Vec<GoalTypeRule>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            artifact: ArtifactConfig::default(),
            selectors: SelectorConfig::default(),
            classify: ClassifyConfig::default(),
            teams: default_team_aliases(),
            goal_types: default_goal_types(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
    /// When set, pages are rendered through a Browserless `/content` endpoint.
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            browserless_url: None,
            browserless_token: None,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub path: PathBuf,
    /// Name of the `const <name> = [ ... ];` block holding the canonical lines.
    pub array_name: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("src/components/RoadSection.astro"),
            array_name: "rawData".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Tried in order until one matches anything.
    pub tables: Vec<String>,
    /// Row selectors relative to the chosen table, tried in order.
    pub rows: Vec<String>,
    pub venue_cell: String,
    /// Zero-based index of the cell whose link text names the competition.
    pub competition_cell: usize,
    /// A team link inside a cell carrying all of these classes is ignored.
    pub skip_link_cell_classes: Vec<String>,
    /// Link titles containing this text point at match reports, not teams.
    pub match_link_marker: String,
    /// Used when a full row has no usable team link.
    pub default_team: String,
    /// Labels recognised in a full row's type cell (case-insensitive substring).
    pub known_goal_types: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            tables: strings(&[
                "table.items",
                "table.inline-table",
                "#yw1",
                ".responsive-table table",
                "table",
            ]),
            rows: strings(&["tbody tr"]),
            venue_cell: "td.hauptlink".to_string(),
            competition_cell: 1,
            skip_link_cell_classes: strings(&["no-border-links", "links"]),
            match_link_marker: "Match".to_string(),
            default_team: "Al-Nassr".to_string(),
            known_goal_types: strings(&[
                "Penalty",
                "Header",
                "Right-footed shot",
                "Left-footed shot",
                "Counter attack goal",
                "Direct free kick",
                "Not reported",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Case-insensitive substrings of competition names that mark a goal non-official.
    pub non_official: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            non_official: strings(&[
                "Friendly",
                "Friendlies",
                "Pre-Season",
                "Club Friendly",
                "Testimonial",
                "Amistoso",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalTypeRule {
    pub keyword: String,
    pub label: String,
}

impl GoalTypeRule {
    pub fn new(keyword: &str, label: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            label: label.to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn default_team_aliases() -> BTreeMap<String, String> {
    [
        ("Al-Nassr FC", "Al-Nassr"),
        ("Al Nassr", "Al-Nassr"),
        ("Al-Nassr Riad", "Al-Nassr"),
        ("Al-Nassr Riyadh", "Al-Nassr"),
        ("Manchester United", "Man United"),
        ("Manchester Utd", "Man United"),
        ("Real Madrid CF", "Real Madrid"),
        ("Juventus FC", "Juventus"),
        ("Sporting CP", "Sporting"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn default_goal_types() -> Vec<GoalTypeRule> {
    vec![
        GoalTypeRule::new("penalty", "Penalty"),
        GoalTypeRule::new("header", "Header"),
        GoalTypeRule::new("free kick", "Direct free kick"),
        GoalTypeRule::new("freekick", "Direct free kick"),
        GoalTypeRule::new("free-kick", "Direct free kick"),
        GoalTypeRule::new("counter", "Counter attack goal"),
        GoalTypeRule::new("counter-attack", "Counter attack goal"),
        GoalTypeRule::new("left foot", "Left-footed shot"),
        GoalTypeRule::new("left-footed", "Left-footed shot"),
        GoalTypeRule::new("right foot", "Right-footed shot"),
        GoalTypeRule::new("right-footed", "Right-footed shot"),
    ]
}

impl ScraperConfig {
    /// Drop blank entries and restore defaults for anything left unusable.
    pub fn sanitize(&mut self) {
        let defaults = SelectorConfig::default();

        clean_list(&mut self.selectors.tables);
        if self.selectors.tables.is_empty() {
            self.selectors.tables = defaults.tables;
        }
        clean_list(&mut self.selectors.rows);
        if self.selectors.rows.is_empty() {
            self.selectors.rows = defaults.rows;
        }
        if self.selectors.venue_cell.trim().is_empty() {
            self.selectors.venue_cell = defaults.venue_cell;
        }
        clean_list(&mut self.selectors.known_goal_types);
        clean_list(&mut self.classify.non_official);

        self.goal_types
            .retain(|r| !r.keyword.trim().is_empty() && !r.label.trim().is_empty());
        for rule in &mut self.goal_types {
            rule.keyword = rule.keyword.trim().to_lowercase();
        }

        if self.source.timeout_ms == 0 {
            self.source.timeout_ms = DEFAULT_TIMEOUT_MS;
        }
        if self.artifact.array_name.trim().is_empty() {
            self.artifact.array_name = ArtifactConfig::default().array_name;
        }
    }
}

/// Trim in place and drop empties, keeping order (order is significant for fallbacks).
fn clean_list(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain_mut(|s| {
        *s = s.trim().to_string();
        !s.is_empty() && seen.insert(s.clone())
    });
}
