//! Shared data model for the crawlforge crawl engine.
//!
//! This crate has no behavior of its own: it carries the `Request` /
//! `DownloadResult` / `ParseResult` / `CrawlResult` / `UrlState` /
//! `CrawlState` record types, the `CrawlerStatus` state machine enum, the
//! error taxonomy, and URL canonicalization, all of which are shared by the
//! scheduler, fetch, extraction, storage and engine crates.

pub mod canonical;
pub mod crawl;
pub mod download;
pub mod error;
pub mod parse;
pub mod request;
pub mod status;

pub use canonical::{canonicalize, CanonicalUrl};
pub use crawl::{CrawlResult, CrawlState, Statistics};
pub use download::DownloadResult;
pub use error::ErrorKind;
pub use parse::ParseResult;
pub use request::{HttpMethod, Request, RequestId};
pub use status::CrawlerStatus;

/// Job identifier, fresh on every `Engine::start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct JobId(pub uuid::Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted per-URL record (spec §3 `UrlState`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UrlState {
    pub url: String,
    pub discovered_at: chrono::DateTime<chrono::Utc>,
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub status_code: Option<u16>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub download_time_ms: Option<u64>,
    pub error_message: Option<String>,
    pub retry_count: u32,
}

impl UrlState {
    pub fn discovered(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            discovered_at: chrono::Utc::now(),
            processed_at: None,
            status_code: None,
            content_length: None,
            content_type: None,
            download_time_ms: None,
            error_message: None,
            retry_count: 0,
        }
    }
}
