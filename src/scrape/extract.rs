// src/scrape/extract.rs
//! Turns the goal-listing table into `RawGoalEvent`s.
//!
//! The page has two row shapes:
//! - a full row: competition, matchday, date, venue, both teams, result, position,
//!   minute, score at the time, goal type, assist
//! - a continuation row for the second, third... goal of the same match: a
//!   `colspan` placeholder followed by minute, score, type, assist
//!
//! Cells are found by content shape rather than fixed index, so small layout
//! changes on the source page do not shift fields.

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::config::{SelectorConfig, DEFAULT_GOAL_TYPE};
use crate::error::{PipelineError, Result};
use crate::scrape::types::RawGoalEvent;

/// How much leading markup a structure failure carries for diagnosis.
const DIAGNOSTIC_HEAD_CHARS: usize = 2_000;

static RE_SOURCE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{2}$").expect("source date regex"));

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|_| PipelineError::Selector(s.to_string()))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub fn page_title(doc: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next().map(text_of))
        .unwrap_or_default()
}

/// Compiled selectors plus the row-shape heuristics.
pub struct Extractor<'a> {
    cfg: &'a SelectorConfig,
    tables: Vec<(String, Selector)>,
    rows: Vec<Selector>,
    any_table: Selector,
    cell: Selector,
    spanned_cell: Selector,
    link: Selector,
    titled_link: Selector,
    venue_cell: Selector,
    known_types: Vec<String>,
}

impl<'a> Extractor<'a> {
    pub fn new(cfg: &'a SelectorConfig) -> Result<Self> {
        let tables = cfg
            .tables
            .iter()
            .map(|s| Ok((s.clone(), parse_selector(s)?)))
            .collect::<Result<Vec<_>>>()?;
        let rows = cfg
            .rows
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            cfg,
            tables,
            rows,
            any_table: parse_selector("table")?,
            cell: parse_selector("td")?,
            spanned_cell: parse_selector("td[colspan]")?,
            link: parse_selector("a")?,
            titled_link: parse_selector("a[title]")?,
            venue_cell: parse_selector(&cfg.venue_cell)?,
            known_types: cfg
                .known_goal_types
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
        })
    }

    /// Locate the goal table and extract every goal it lists, in row order.
    pub fn extract(&self, doc: &Html) -> Result<Vec<RawGoalEvent>> {
        let table = self.locate_table(doc)?;
        Ok(self.extract_rows(table))
    }

    /// The selector list only confirms that the page carries a goal table at
    /// all; the table with the most body rows anywhere in the document wins
    /// (first seen on ties).
    pub fn locate_table<'d>(&self, doc: &'d Html) -> Result<ElementRef<'d>> {
        let matched = self.tables.iter().find(|(raw, sel)| {
            let hit = doc.select(sel).next().is_some();
            if !hit {
                tracing::debug!(target: "scrape", selector = %raw, "no table matched");
            }
            hit
        });
        let best = matched.and_then(|(raw, _)| {
            let mut best: Option<(ElementRef<'d>, usize)> = None;
            for t in doc.select(&self.any_table) {
                let n = self.rows_of(t).len();
                if best.map_or(true, |(_, most)| n > most) {
                    best = Some((t, n));
                }
            }
            if let Some((_, rows)) = best {
                tracing::info!(target: "scrape", selector = %raw, rows, "found goals table");
            }
            best.map(|(t, _)| t)
        });
        if let Some(table) = best {
            return Ok(table);
        }

        let html = doc.html();
        let err = PipelineError::Structure {
            tried: self.tables.iter().map(|(raw, _)| raw.clone()).collect(),
            title: page_title(doc),
            head: html.chars().take(DIAGNOSTIC_HEAD_CHARS).collect(),
        };
        if let Some(dump) = err.diagnostic() {
            tracing::error!(target: "scrape", "no goals table on page\n{dump}");
        }
        Err(err)
    }

    /// Rows of `table` using the first row selector that yields any.
    fn rows_of<'d>(&self, table: ElementRef<'d>) -> Vec<ElementRef<'d>> {
        for sel in &self.rows {
            let rows: Vec<_> = table.select(sel).collect();
            if !rows.is_empty() {
                return rows;
            }
        }
        Vec::new()
    }

    pub fn extract_rows(&self, table: ElementRef<'_>) -> Vec<RawGoalEvent> {
        let rows = self.rows_of(table);
        counter!("scrape_rows_total").increment(rows.len() as u64);

        let mut out = Vec::new();
        // Last emitted full row; continuation rows inherit its match fields.
        let mut current: Option<RawGoalEvent> = None;

        for row in rows {
            let cells: Vec<ElementRef<'_>> = row.select(&self.cell).collect();
            if cells.len() < 4 {
                continue;
            }

            if row.select(&self.spanned_cell).next().is_some() {
                let Some(ctx) = current.as_ref() else {
                    tracing::debug!(target: "scrape", "continuation row without a match, dropped");
                    continue;
                };
                let texts: Vec<String> = cells.iter().map(|c| text_of(*c)).collect();
                if let Some(ev) = continuation_event(ctx, &texts) {
                    out.push(ev);
                }
                continue;
            }

            if let Some(ev) = self.full_row_event(row, &cells) {
                out.push(ev.clone());
                current = Some(ev);
            }
        }

        counter!("scrape_events_total").increment(out.len() as u64);
        out
    }

    fn full_row_event(&self, row: ElementRef<'_>, cells: &[ElementRef<'_>]) -> Option<RawGoalEvent> {
        let texts: Vec<String> = cells.iter().map(|c| text_of(*c)).collect();

        let competition = cells
            .get(self.cfg.competition_cell)
            .map(|cell| match cell.select(&self.link).next() {
                Some(a) => text_of(a),
                None => texts[self.cfg.competition_cell].clone(),
            })
            .unwrap_or_default();

        let date = texts.iter().find(|t| RE_SOURCE_DATE.is_match(t)).cloned()?;
        let minute = texts
            .iter()
            .find(|t| t.contains('\'') && t.chars().any(|c| c.is_ascii_digit()))
            .cloned()?;

        let venue = row
            .select(&self.venue_cell)
            .next()
            .map(text_of)
            .filter(|v| matches!(v.as_str(), "H" | "A" | "N"))
            .unwrap_or_else(|| "N".to_string());

        let (for_team, opponent) = self.team_titles(row);

        let goal_type = texts
            .iter()
            .find(|t| {
                let lower = t.to_lowercase();
                self.known_types.iter().any(|k| lower.contains(k.as_str()))
            })
            .cloned()
            .unwrap_or_else(|| DEFAULT_GOAL_TYPE.to_string());

        Some(RawGoalEvent {
            competition,
            date,
            venue,
            for_team: for_team.unwrap_or_else(|| self.cfg.default_team.clone()),
            opponent: opponent.unwrap_or_default(),
            minute,
            goal_type,
        })
    }

    /// First two titled links that are not match-report links: acting team, then opponent.
    fn team_titles(&self, row: ElementRef<'_>) -> (Option<String>, Option<String>) {
        let mut for_team: Option<String> = None;
        let mut opponent: Option<String> = None;

        for link in row.select(&self.titled_link) {
            let Some(cell) = enclosing_cell(link) else {
                continue;
            };
            if self.is_skipped_cell(cell) {
                continue;
            }
            let title = link.value().attr("title").unwrap_or_default();
            if title.is_empty() || title.contains(self.cfg.match_link_marker.as_str()) {
                continue;
            }
            if for_team.is_none() {
                for_team = Some(title.to_string());
            } else if opponent.is_none() {
                opponent = Some(title.to_string());
                break;
            }
        }
        (for_team, opponent)
    }

    fn is_skipped_cell(&self, cell: ElementRef<'_>) -> bool {
        let classes = &self.cfg.skip_link_cell_classes;
        !classes.is_empty()
            && classes
                .iter()
                .all(|c| cell.value().classes().any(|have| have == c.as_str()))
    }
}

fn enclosing_cell(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "td")
}

/// Build the event for a continuation row from the current match context.
/// Returns `None` when the row has no minute.
fn continuation_event(ctx: &RawGoalEvent, texts: &[String]) -> Option<RawGoalEvent> {
    let minute = texts.iter().find(|t| t.contains('\''))?.clone();

    // Type is usually the last meaningful text: skip minutes and scores ("1:0").
    let goal_type = texts
        .iter()
        .rev()
        .find(|t| !t.is_empty() && !t.contains('\'') && !t.contains(':') && t.chars().count() > 2)
        .cloned()
        .unwrap_or_else(|| DEFAULT_GOAL_TYPE.to_string());

    Some(RawGoalEvent {
        minute,
        goal_type,
        ..ctx.clone()
    })
}

/// Shape of one table on the page, for `--debug`.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub index: usize,
    pub class_name: String,
    pub row_count: usize,
    pub sample_rows: Vec<SampleRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleRow {
    pub row_index: usize,
    pub cell_count: usize,
    pub cells: Vec<String>,
}

pub fn describe_tables(doc: &Html) -> Vec<TableSummary> {
    let (Ok(table), Ok(row), Ok(cell)) = (
        Selector::parse("table"),
        Selector::parse("tbody tr"),
        Selector::parse("td"),
    ) else {
        return Vec::new();
    };

    doc.select(&table)
        .enumerate()
        .map(|(index, t)| {
            let rows: Vec<_> = t.select(&row).collect();
            let sample_rows = rows
                .iter()
                .take(5)
                .enumerate()
                .map(|(row_index, r)| {
                    let cells: Vec<String> = r
                        .select(&cell)
                        .map(|c| text_of(c).chars().take(50).collect())
                        .collect();
                    SampleRow {
                        row_index,
                        cell_count: cells.len(),
                        cells,
                    }
                })
                .collect();
            TableSummary {
                index,
                class_name: t.value().attr("class").unwrap_or_default().to_string(),
                row_count: rows.len(),
                sample_rows,
            }
        })
        .collect()
}
