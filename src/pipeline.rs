// src/pipeline.rs
//! One run: read artifact -> fetch -> extract -> normalize -> diff -> number -> merge -> write.
//! Every stage finishes before the next starts; nothing is written until the
//! merged content is fully built.

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use scraper::Html;
use std::fmt;

use crate::config::ScraperConfig;
use crate::normalize::{sort_newest_first, CanonicalGoalRecord, Normalizer};
use crate::persist::{merge_lines, ArtifactDocument};
use crate::reconcile::{assign_numbers, find_new, highest_number};
use crate::scrape::extract::{describe_tables, Extractor};
use crate::scrape::types::{PageFetcher, PageSnapshot, RawGoalEvent};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_rows_total", "Table rows seen by the extractor.");
        describe_counter!("scrape_events_total", "Goal events extracted from the page.");
        describe_counter!(
            "normalize_warnings_total",
            "Values that matched no known format and fell back to a default."
        );
        describe_counter!("reconcile_new_total", "Goals not present in the artifact.");
        describe_counter!("persist_writes_total", "Artifact rewrites.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute and report the diff without touching the artifact.
    pub dry_run: bool,
    /// Log the shape of every table on the page before extracting.
    pub debug: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub existing: usize,
    pub new: usize,
    pub total: usize,
    /// Canonical lines of the new goals, newest first.
    pub new_lines: Vec<String>,
    pub warnings: usize,
    pub dry_run: bool,
    pub written: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode: {}", if self.dry_run { "DRY RUN" } else { "LIVE" })?;
        if self.new == 0 {
            writeln!(f, "Existing: {}", self.existing)?;
            return writeln!(f, "No new goals found.");
        }
        writeln!(f, "Existing: {}", self.existing)?;
        writeln!(f, "New: {}", self.new)?;
        writeln!(f, "Total after merge: {}", self.total)?;
        if self.warnings > 0 {
            writeln!(f, "Warnings: {}", self.warnings)?;
        }
        writeln!(f, "New goals found:")?;
        for line in &self.new_lines {
            writeln!(f, "  + {line}")?;
        }
        if self.dry_run {
            writeln!(f, "DRY RUN - skipping file update. Would add:")?;
            for line in &self.new_lines {
                writeln!(f, "    {line}")?;
            }
        } else if self.written {
            writeln!(f, "Successfully added {} new goal(s)!", self.new)?;
        } else {
            writeln!(f, "No changes needed.")?;
        }
        Ok(())
    }
}

/// Parse the snapshot and pull goal events out of the listing table.
pub fn scrape_page(cfg: &ScraperConfig, page: &PageSnapshot, debug: bool) -> Result<Vec<RawGoalEvent>> {
    let doc = Html::parse_document(&page.html);

    if debug {
        let tables = describe_tables(&doc);
        let dump = serde_json::to_string_pretty(&tables).unwrap_or_default();
        tracing::info!(target: "scrape", count = tables.len(), "table debug info:\n{dump}");
    }

    let extractor = Extractor::new(&cfg.selectors)?;
    let events = extractor
        .extract(&doc)
        .with_context(|| format!("extracting goals from {}", page.url))?;
    tracing::info!(target: "scrape", goals = events.len(), "scraped goals from first page");
    Ok(events)
}

/// Normalize every event and order the batch newest first.
/// Returns the records and the number of soft warnings raised.
pub fn transform(cfg: &ScraperConfig, events: &[RawGoalEvent]) -> (Vec<CanonicalGoalRecord>, usize) {
    let normalizer = Normalizer::new(cfg);
    let mut warnings = 0usize;
    let mut records: Vec<CanonicalGoalRecord> = events
        .iter()
        .map(|ev| {
            let n = normalizer.normalize(ev);
            warnings += n.warnings.len();
            n.record
        })
        .collect();
    counter!("normalize_warnings_total").increment(warnings as u64);
    sort_newest_first(&mut records);
    (records, warnings)
}

pub async fn run(
    cfg: &ScraperConfig,
    fetcher: &dyn PageFetcher,
    opts: RunOptions,
) -> Result<RunSummary> {
    ensure_metrics_described();
    gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    // Read the artifact first: a malformed file aborts before any network work.
    let doc = ArtifactDocument::load(&cfg.artifact.path, &cfg.artifact.array_name)
        .context("reading existing goals")?;
    let existing = doc.lines();
    tracing::info!(target: "pipeline", existing = existing.len(), "read existing goals");

    let page = fetcher
        .fetch(&cfg.source.url, cfg.source.timeout())
        .await
        .with_context(|| format!("fetching goals via {}", fetcher.name()))?;
    let events = scrape_page(cfg, &page, opts.debug)?;

    let (records, warnings) = transform(cfg, &events);
    tracing::info!(target: "pipeline", transformed = records.len(), warnings, "transformed goals");

    let fresh = find_new(records, existing);
    let mut summary = RunSummary {
        existing: existing.len(),
        new: fresh.len(),
        total: existing.len() + fresh.len(),
        warnings,
        dry_run: opts.dry_run,
        ..RunSummary::default()
    };
    if fresh.is_empty() {
        tracing::info!(target: "pipeline", "no new goals found");
        return Ok(summary);
    }

    let highest = highest_number(existing);
    tracing::info!(target: "pipeline", highest, "highest existing goal number");
    let numbered = assign_numbers(fresh, highest);
    summary.new_lines = numbered.iter().map(CanonicalGoalRecord::line).collect();

    if opts.dry_run {
        tracing::info!(target: "pipeline", new = summary.new, "dry run, artifact left untouched");
        return Ok(summary);
    }

    let merged = merge_lines(&summary.new_lines, existing);
    summary.written = doc
        .write_lines(&merged)
        .with_context(|| format!("updating {}", doc.path().display()))?;
    Ok(summary)
}
