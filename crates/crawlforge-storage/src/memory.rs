use crate::error::StorageError;
use crate::Storage;
use async_trait::async_trait;
use crawlforge_types::{CrawlResult, CrawlState, JobId, UrlState};
use dashmap::DashMap;
use tracing::debug;

/// `DashMap`-backed reference `Storage` implementation. Not durable across
/// process restarts; intended for tests and for running the engine
/// standalone without wiring in a real backend.
#[derive(Default)]
pub struct MemoryStorage {
    results: DashMap<(JobId, String), CrawlResult>,
    url_states: DashMap<String, UrlState>,
    crawl_states: DashMap<JobId, CrawlState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn url_state_count(&self) -> usize {
        self.url_states.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_result(&self, job_id: JobId, result: CrawlResult) -> Result<(), StorageError> {
        let key = (job_id, result.request.url.clone());
        debug!(job_id = %job_id, url = %result.request.url, "saving crawl result");
        self.results.insert(key, result);
        Ok(())
    }

    async fn save_url_state(&self, state: UrlState) -> Result<(), StorageError> {
        debug!(url = %state.url, "upserting url state");
        self.url_states.insert(state.url.clone(), state);
        Ok(())
    }

    async fn load_crawl_state(&self, job_id: JobId) -> Result<Option<CrawlState>, StorageError> {
        Ok(self.crawl_states.get(&job_id).map(|entry| entry.clone()))
    }

    async fn save_crawl_state(&self, state: CrawlState) -> Result<(), StorageError> {
        debug!(job_id = %state.job_id, "checkpointing crawl state");
        self.crawl_states.insert(state.job_id, state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlforge_types::{DownloadResult, ParseResult, Request, Statistics};
    use chrono::Utc;

    fn sample_result(url: &str) -> CrawlResult {
        let request = Request::seed(url);
        let download = DownloadResult::success(
            url,
            request.id(),
            b"ok".to_vec(),
            Some("ok".to_string()),
            Some("text/plain".to_string()),
            200,
            Default::default(),
            5,
        );
        let parse = ParseResult::empty(url);
        CrawlResult {
            request,
            download,
            parse,
            processed_at: Utc::now(),
            total_time_ms: 5,
        }
    }

    #[tokio::test]
    async fn save_result_is_idempotent_by_job_and_url() {
        let storage = MemoryStorage::new();
        let job_id = JobId::new();
        storage.save_result(job_id, sample_result("https://example.com/a")).await.unwrap();
        storage.save_result(job_id, sample_result("https://example.com/a")).await.unwrap();
        assert_eq!(storage.result_count(), 1);
    }

    #[tokio::test]
    async fn save_url_state_upserts() {
        let storage = MemoryStorage::new();
        storage.save_url_state(UrlState::discovered("https://example.com/a")).await.unwrap();
        let mut updated = UrlState::discovered("https://example.com/a");
        updated.status_code = Some(200);
        storage.save_url_state(updated).await.unwrap();
        assert_eq!(storage.url_state_count(), 1);
    }

    #[tokio::test]
    async fn crawl_state_round_trips() {
        let storage = MemoryStorage::new();
        let job_id = JobId::new();
        assert!(storage.load_crawl_state(job_id).await.unwrap().is_none());

        let state = CrawlState { job_id, stats: Statistics::new(job_id) };
        storage.save_crawl_state(state).await.unwrap();

        let loaded = storage.load_crawl_state(job_id).await.unwrap();
        assert_eq!(loaded.unwrap().job_id, job_id);
    }
}
