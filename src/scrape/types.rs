// src/scrape/types.rs
use std::time::Duration;

use crate::error::Result;

/// One goal as it appears on the listing page, before any normalization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, Default)]
pub struct RawGoalEvent {
    pub competition: String,
    pub date: String,  // DD/MM/YY on the source page
    pub venue: String, // H, A or N
    pub for_team: String,
    pub opponent: String,
    pub minute: String, // e.g. "45+2'"
    pub goal_type: String,
}

/// Markup of one fetched page.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<PageSnapshot>;
    fn name(&self) -> &'static str;
}
