pub mod arxiv;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// One paper parsed out of the arXiv Atom feed.
#[derive(Debug, Clone, Serialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub pdf_link: String,
    pub published: Option<DateTime<Utc>>,
}

impl PaperRecord {
    /// Truncated prefix of the abstract for display, with an ellipsis marker
    /// when the abstract is longer than `max_chars`. Counts characters, not
    /// bytes, so multi-byte text is never split.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.summary.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
