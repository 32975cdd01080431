use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique, immutable identifier for a `Request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
    Put,
    Delete,
}

impl Default for HttpMethod {
    fn default() -> Self {
        Self::Get
    }
}

/// The unit of work passed between Engine, Scheduler and Downloader.
///
/// Invariants: `0 <= retry_count <= max_retries`, `depth >= 0`, `id` never
/// changes after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    pub url: String,
    pub depth: u32,
    pub priority: i64,
    pub referrer: Option<String>,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Request {
    /// Build a depth-0 seed request with default priority.
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            url: url.into(),
            depth: 0,
            priority: 0,
            referrer: None,
            method: HttpMethod::Get,
            headers: HashMap::new(),
            retry_count: 0,
            max_retries: 3,
            queued_at: Utc::now(),
            started_at: None,
            metadata: HashMap::new(),
        }
    }

    /// Build a child request discovered while processing `parent`, with
    /// depth incremented and priority inherited (the scheduler applies the
    /// depth penalty at insert time, not here).
    pub fn child(parent: &Request, url: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            url: url.into(),
            depth: parent.depth + 1,
            priority: parent.priority,
            referrer: Some(parent.url.clone()),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            retry_count: 0,
            max_retries: parent.max_retries,
            queued_at: Utc::now(),
            started_at: None,
            metadata: HashMap::new(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Produce the next retry attempt of this request: same id, bumped
    /// retry_count, fresh queued_at. Callers must check `can_retry()` first.
    pub fn next_attempt(&self) -> Self {
        let mut next = self.clone();
        next.retry_count += 1;
        next.queued_at = Utc::now();
        next.started_at = None;
        next
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    pub fn mark_started(&mut self) {
        self.started_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_depth_zero_and_immutable_id() {
        let req = Request::seed("https://example.com");
        assert_eq!(req.depth, 0);
        let id = req.id();
        assert_eq!(id, req.id());
    }

    #[test]
    fn child_increments_depth_and_sets_referrer() {
        let parent = Request::seed("https://example.com").with_priority(5);
        let child = Request::child(&parent, "https://example.com/next");
        assert_eq!(child.depth, 1);
        assert_eq!(child.referrer.as_deref(), Some("https://example.com"));
        assert_eq!(child.priority, 5);
    }

    #[test]
    fn retry_cap_respected() {
        let req = Request::seed("https://example.com").with_max_retries(2);
        assert!(req.can_retry());
        let r1 = req.next_attempt();
        assert_eq!(r1.retry_count, 1);
        assert!(r1.can_retry());
        let r2 = r1.next_attempt();
        assert_eq!(r2.retry_count, 2);
        assert!(!r2.can_retry());
    }
}
