//! The persistence contract the core requires of an external storage
//! collaborator (spec §6), plus an in-memory reference implementation.
//!
//! The core does not dictate how a backend represents `crawl_results`,
//! `url_states` or `crawl_state` (filesystem tree, relational, key-value);
//! it only requires the four operations below, each safe for concurrent
//! callers. `MemoryStorage` is a `DashMap`-backed implementation used by the
//! engine's own tests and as a runnable default when no external backend is
//! wired in.

mod error;
mod memory;

pub use error::StorageError;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use crawlforge_types::{CrawlResult, CrawlState, JobId, UrlState};

/// Persistence contract. Implementations must be safe for concurrent
/// callers; ordering across writers is not guaranteed (spec §5).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Idempotent by `(job_id, result.request.url)`.
    async fn save_result(&self, job_id: JobId, result: CrawlResult) -> Result<(), StorageError>;

    /// Upsert keyed by `state.url`.
    async fn save_url_state(&self, state: UrlState) -> Result<(), StorageError>;

    /// Returns `None` if no checkpoint has been saved for `job_id`.
    async fn load_crawl_state(&self, job_id: JobId) -> Result<Option<CrawlState>, StorageError>;

    /// Checkpoint, keyed by `state.job_id`.
    async fn save_crawl_state(&self, state: CrawlState) -> Result<(), StorageError>;
}
