use crawlforge_types::{CrawlResult, CrawlerStatus, Request};

/// The four observable event kinds from spec §4.1.
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    CrawlCompleted { result: Box<CrawlResult> },
    CrawlError { url: String, error_kind: String, message: String },
    UrlDiscovered { request: Box<Request> },
    StatusChanged { previous: CrawlerStatus, current: CrawlerStatus, message: String },
}

impl CrawlEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            CrawlEvent::CrawlCompleted { .. } => "crawl_completed",
            CrawlEvent::CrawlError { .. } => "crawl_error",
            CrawlEvent::UrlDiscovered { .. } => "url_discovered",
            CrawlEvent::StatusChanged { .. } => "status_changed",
        }
    }
}

/// Subscriber contract. Handlers MUST NOT block indefinitely: the bus calls
/// them synchronously on the publishing worker's thread, so a slow handler
/// stalls that worker.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &CrawlEvent);

    /// Human-readable name, used for registration bookkeeping.
    fn name(&self) -> &str;
}
