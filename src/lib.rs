// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod reconcile;
pub mod scrape;

// ---- Re-exports for stable public API ----
pub use crate::config::ScraperConfig;
pub use crate::error::PipelineError;
pub use crate::normalize::{CanonicalGoalRecord, GoalNumber, Venue};
pub use crate::pipeline::{run, RunOptions, RunSummary};
pub use crate::scrape::types::{PageFetcher, PageSnapshot, RawGoalEvent};
