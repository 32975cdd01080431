use crate::download::DownloadResult;
use crate::parse::ParseResult;
use crate::request::Request;
use crate::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The tuple (Request, DownloadResult, ParseResult, processed_at, total
/// processing time) produced by a worker iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub request: Request,
    pub download: DownloadResult,
    pub parse: ParseResult,
    pub processed_at: DateTime<Utc>,
    pub total_time_ms: u64,
}

/// Per-domain breakdown tracked alongside the job-level counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainBreakdown {
    pub processed: u64,
    pub success: u64,
    pub error: u64,
    pub total_bytes: u64,
}

/// Running counters published via `Engine::get_statistics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub job_id: JobId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub discovered: u64,
    pub processed: u64,
    pub success: u64,
    pub error: u64,
    pub skipped: u64,
    pub total_bytes: u64,
    pub total_download_time_ms: u64,
    pub per_domain: HashMap<String, DomainBreakdown>,
}

impl Statistics {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            started_at: Utc::now(),
            ended_at: None,
            discovered: 0,
            processed: 0,
            success: 0,
            error: 0,
            skipped: 0,
            total_bytes: 0,
            total_download_time_ms: 0,
            per_domain: HashMap::new(),
        }
    }

    pub fn average_download_time_ms(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.total_download_time_ms as f64 / self.processed as f64
        }
    }

    pub fn record(&mut self, domain: &str, bytes: u64, download_time_ms: u64, success: bool) {
        self.processed += 1;
        self.total_bytes += bytes;
        self.total_download_time_ms += download_time_ms;
        if success {
            self.success += 1;
        } else {
            self.error += 1;
        }
        let entry = self.per_domain.entry(domain.to_string()).or_default();
        entry.processed += 1;
        entry.total_bytes += bytes;
        if success {
            entry.success += 1;
        } else {
            entry.error += 1;
        }
    }
}

/// A checkpointable snapshot of a job's counters, persisted via
/// `Storage::save_crawl_state` for resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlState {
    pub job_id: JobId,
    pub stats: Statistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_download_time_is_zero_with_no_samples() {
        let stats = Statistics::new(JobId::new());
        assert_eq!(stats.average_download_time_ms(), 0.0);
    }

    #[test]
    fn record_updates_domain_breakdown() {
        let mut stats = Statistics::new(JobId::new());
        stats.record("example.com", 100, 50, true);
        stats.record("example.com", 200, 150, false);
        let domain = stats.per_domain.get("example.com").unwrap();
        assert_eq!(domain.processed, 2);
        assert_eq!(domain.success, 1);
        assert_eq!(domain.error, 1);
        assert_eq!(domain.total_bytes, 300);
        assert_eq!(stats.average_download_time_ms(), 100.0);
    }
}
