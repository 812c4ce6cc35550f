// src/error.rs
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fatal conditions that abort a run before anything is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("timed out after {}ms fetching {url}", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    #[error("network error fetching {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("upstream returned status {status} for {url}")]
    Upstream { url: String, status: u16 },

    #[error("reading page snapshot {}: {source}", .path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not find goals table (tried {}); page title: {title:?}", .tried.join(", "))]
    Structure {
        tried: Vec<String>,
        title: String,
        /// Leading markup of the page, kept for selector maintenance.
        head: String,
    },

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("{}: could not find `{marker}` array", .path.display())]
    MalformedArtifact { path: PathBuf, marker: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Selector-maintenance dump for a structure mismatch: page title, the
    /// selectors tried and the leading markup. `None` for every other failure.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            PipelineError::Structure { tried, title, head } => Some(format!(
                "page title: {title}\ntried selectors: {}\nleading markup:\n{head}",
                tried.join(", ")
            )),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
