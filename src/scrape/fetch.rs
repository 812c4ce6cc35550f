// src/scrape/fetch.rs
//! Page fetchers. Each run builds exactly one and drops it when the run ends.

use async_trait::async_trait;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::SourceConfig;
use crate::error::{PipelineError, Result};
use crate::scrape::types::{PageFetcher, PageSnapshot};

/// Pick the fetcher for this run: a saved snapshot wins, then Browserless, then plain HTTP.
pub fn from_config(source: &SourceConfig, snapshot: Option<&Path>) -> Box<dyn PageFetcher> {
    if let Some(path) = snapshot {
        return Box::new(FileFetcher::new(path));
    }
    match &source.browserless_url {
        Some(base) => Box::new(BrowserlessFetcher::new(
            base,
            source.browserless_token.as_deref(),
            &source.user_agent,
        )),
        None => Box::new(HttpFetcher::new(&source.user_agent)),
    }
}

/// Bound a fetch future by `timeout`; expiry is a fatal fetch failure.
async fn bounded<F>(url: &str, timeout: Duration, fut: F) -> Result<String>
where
    F: Future<Output = Result<String>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(PipelineError::Timeout {
            url: url.to_string(),
            timeout,
        }),
    }
}

fn map_reqwest(url: &str, timeout: Duration, e: reqwest::Error) -> PipelineError {
    if e.is_timeout() {
        PipelineError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        PipelineError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

async fn read_body(url: &str, timeout: Duration, resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    if !status.is_success() {
        return Err(PipelineError::Upstream {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    resp.text().await.map_err(|e| map_reqwest(url, timeout, e))
}

/// Plain GET. Sufficient when the listing is server-rendered.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "http client builder failed, using defaults");
                reqwest::Client::new()
            });
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<PageSnapshot> {
        tracing::info!(target: "scrape", url, fetcher = self.name(), "navigating to source");
        let html = bounded(url, timeout, async {
            let resp = self
                .client
                .get(url)
                .header("Accept-Language", "en-US,en;q=0.9")
                .send()
                .await
                .map_err(|e| map_reqwest(url, timeout, e))?;
            read_body(url, timeout, resp).await
        })
        .await?;
        Ok(PageSnapshot {
            url: url.to_string(),
            html,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

impl Drop for HttpFetcher {
    fn drop(&mut self) {
        tracing::debug!(target: "scrape", "http fetcher released");
    }
}

/// Renders the page in a headless browser behind a Browserless `/content` endpoint.
pub struct BrowserlessFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    user_agent: String,
}

impl BrowserlessFetcher {
    pub fn new(base_url: &str, token: Option<&str>, user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            user_agent: user_agent.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }
}

#[async_trait]
impl PageFetcher for BrowserlessFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<PageSnapshot> {
        tracing::info!(target: "scrape", url, fetcher = self.name(), "rendering source page");
        let body = serde_json::json!({
            "url": url,
            "userAgent": self.user_agent,
            "gotoOptions": { "waitUntil": "domcontentloaded", "timeout": timeout.as_millis() as u64 },
        });
        let html = bounded(url, timeout, async {
            let resp = self
                .client
                .post(self.endpoint())
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| map_reqwest(url, timeout, e))?;
            read_body(url, timeout, resp).await
        })
        .await?;
        Ok(PageSnapshot {
            url: url.to_string(),
            html,
        })
    }

    fn name(&self) -> &'static str {
        "browserless"
    }
}

impl Drop for BrowserlessFetcher {
    fn drop(&mut self) {
        tracing::debug!(target: "scrape", "browserless session released");
    }
}

/// Reads a page saved earlier; the URL is only recorded on the snapshot.
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageFetcher for FileFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<PageSnapshot> {
        tracing::info!(target: "scrape", path = %self.path.display(), "reading saved page");
        let html = bounded(url, timeout, async {
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| PipelineError::Snapshot {
                    path: self.path.clone(),
                    source,
                })
        })
        .await?;
        Ok(PageSnapshot {
            url: url.to_string(),
            html,
        })
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
