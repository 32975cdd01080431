use crate::domain::DomainRecord;
use crate::filter::UrlFilter;
use crawlforge_types::{canonicalize, CanonicalUrl, Request};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use url::Url;

/// Positive constant added per depth level so deep URLs sink (spec §4.2).
const DEPTH_PENALTY: i64 = 5;

/// Small additive penalty applied when a candidate is skipped because its
/// domain is not yet ready, so it doesn't get popped again immediately.
const SKIP_PENALTY: i64 = 1;

pub struct SchedulerConfig {
    pub allowed_domains: Vec<String>,
    pub blocked_patterns: Vec<String>,
    pub max_depth: u32,
    pub request_delay: Duration,
    pub worker_count: usize,
    /// Heap bound (spec §4.2 "Failure modes"). `None` leaves the queue
    /// unbounded.
    pub max_queue_size: Option<usize>,
}

struct HeapEntry {
    effective_priority: i64,
    sequence: u64,
    request: Request,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.effective_priority == other.effective_priority && self.sequence == other.sequence
    }
}

impl Eq for HeapEntry {}

// BinaryHeap is a max-heap; reverse both fields so lower effective_priority
// and earlier sequence number pop first (min-heap with FIFO tie-break).
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .effective_priority
            .cmp(&self.effective_priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Inner {
    heap: BinaryHeap<HeapEntry>,
    seen: HashSet<CanonicalUrl>,
    domains: HashMap<String, DomainRecord>,
}

/// Owns the priority frontier, the seen-URL set and the per-domain access
/// table behind a single mutex, per the spec's "Scheduler exclusively owns"
/// ownership rule. Callers see `add`/`next` as atomic.
pub struct Scheduler {
    inner: Mutex<Inner>,
    filter: UrlFilter,
    request_delay: Duration,
    worker_count: usize,
    max_queue_size: Option<usize>,
    next_sequence: AtomicU64,
    processed_count: AtomicU64,
    error_count: AtomicU64,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                seen: HashSet::new(),
                domains: HashMap::new(),
            }),
            filter: UrlFilter::new(config.allowed_domains, &config.blocked_patterns, config.max_depth),
            request_delay: config.request_delay,
            worker_count: config.worker_count.max(1),
            max_queue_size: config.max_queue_size,
            next_sequence: AtomicU64::new(0),
            processed_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
        }
    }

    /// Insert `request` if it passes the URL filter and has not been seen
    /// before. Returns `true` only on actual insertion.
    pub fn add(&self, request: Request) -> bool {
        let Some(canonical) = canonicalize(&request.url) else {
            trace!(url = %request.url, "rejected unparseable url");
            return false;
        };
        let Ok(parsed) = Url::parse(&request.url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        if !self.filter.accepts(&request.url, host, request.depth) {
            return false;
        }

        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        if inner.seen.contains(&canonical) {
            return false;
        }
        inner.seen.insert(canonical);
        self.push_locked(&mut inner, request, host);
        true
    }

    /// Insert `request` without consulting the seen-set; used for retry
    /// re-entry, where the URL was already recorded as seen on first pass.
    pub fn add_retry(&self, request: Request) -> bool {
        let Ok(parsed) = Url::parse(&request.url) else {
            return false;
        };
        let Some(host) = parsed.host_str().map(str::to_string) else {
            return false;
        };
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        self.push_locked(&mut inner, request, &host);
        true
    }

    pub fn add_batch(&self, requests: Vec<Request>) -> usize {
        requests.into_iter().filter(|r| self.add(r.clone())).count()
    }

    fn push_locked(&self, inner: &mut Inner, request: Request, host: &str) {
        let domain = inner.domains.entry(host.to_string()).or_default();
        let effective = request.priority + request.depth as i64 * DEPTH_PENALTY + domain.slowdown();
        let sequence = self.next_sequence.fetch_add(1, AtomicOrdering::SeqCst);
        inner.heap.push(HeapEntry {
            effective_priority: effective,
            sequence,
            request,
        });
        self.evict_overflow_locked(inner);
    }

    /// Queue overflow (spec §4.2 "Failure modes"): once the heap exceeds
    /// `max_queue_size`, evict the lowest-precedence entry (highest
    /// `effective_priority`, i.e. the one `next()` would pop last) until the
    /// bound holds again. The entry just inserted is itself eligible.
    fn evict_overflow_locked(&self, inner: &mut Inner) {
        let Some(max_queue_size) = self.max_queue_size else {
            return;
        };
        while inner.heap.len() > max_queue_size {
            let mut sorted = std::mem::take(&mut inner.heap).into_sorted_vec();
            let evicted = sorted.remove(0);
            warn!(
                url = %evicted.request.url,
                max_queue_size,
                "queue overflow, evicting lowest-priority entry"
            );
            inner.heap = sorted.into_iter().collect();
        }
    }

    /// Pop the next ready request. Skips candidates whose host is still
    /// within its required delay window, re-inserting them with a small
    /// penalty; after `3 * worker_count` skips returns `None` (backpressure).
    pub fn next(&self) -> Option<Request> {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        let now = Instant::now();
        let max_skips = 3 * self.worker_count;
        let mut skipped = Vec::new();

        let result = loop {
            let Some(entry) = inner.heap.pop() else {
                break None;
            };
            let Ok(parsed) = Url::parse(&entry.request.url) else {
                break Some(entry.request);
            };
            let Some(host) = parsed.host_str().map(str::to_string) else {
                break Some(entry.request);
            };

            let ready = inner.domains.get(&host).map(|d| d.ready(now)).unwrap_or(true);
            if ready {
                let domain = inner.domains.entry(host).or_default();
                domain.mark_accessed(now);
                domain.required_delay = self.request_delay;
                break Some(entry.request);
            }

            if skipped.len() >= max_skips {
                inner.heap.push(entry);
                warn!(skipped = skipped.len(), "scheduler backpressure, no domain ready");
                break None;
            }
            skipped.push((entry.effective_priority + SKIP_PENALTY, entry.sequence, entry.request));
        };

        for (priority, sequence, request) in skipped {
            inner.heap.push(HeapEntry {
                effective_priority: priority,
                sequence,
                request,
            });
        }

        if let Some(request) = &result {
            self.processed_count.fetch_add(1, AtomicOrdering::SeqCst);
            debug!(url = %request.url, "scheduler dispatched request");
        }
        result
    }

    /// Fold an observed (latency, success) sample into a host's adaptive
    /// priority record. Called by workers after every download attempt.
    pub fn record_domain_performance(&self, host: &str, latency_ms: f64, success: bool) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        inner.domains.entry(host.to_string()).or_default().record(latency_ms, success);
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, AtomicOrdering::SeqCst);
    }

    pub fn queued_count(&self) -> usize {
        self.inner.lock().expect("scheduler lock poisoned").heap.len()
    }

    pub fn processed_count(&self) -> u64 {
        self.processed_count.load(AtomicOrdering::SeqCst)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(AtomicOrdering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.queued_count() == 0
    }

    /// Clear the heap, seen-set, domain table and counters, so a fresh
    /// `Engine::start` begins with an empty frontier (spec §4.1 "initializes
    /// the seen-set").
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        inner.heap.clear();
        inner.seen.clear();
        inner.domains.clear();
        self.processed_count.store(0, AtomicOrdering::SeqCst);
        self.error_count.store(0, AtomicOrdering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(worker_count: usize) -> Scheduler {
        Scheduler::new(SchedulerConfig {
            allowed_domains: Vec::new(),
            blocked_patterns: Vec::new(),
            max_depth: 10,
            request_delay: Duration::from_millis(0),
            worker_count,
            max_queue_size: None,
        })
    }

    #[test]
    fn invalid_url_is_rejected_without_side_effects() {
        let scheduler = scheduler(4);
        assert!(!scheduler.add(Request::seed("not a url")));
        assert_eq!(scheduler.queued_count(), 0);
    }

    #[test]
    fn duplicate_canonical_url_is_rejected() {
        let scheduler = scheduler(4);
        assert!(scheduler.add(Request::seed("https://example.com/a")));
        assert!(!scheduler.add(Request::seed("https://EXAMPLE.com/a#frag")));
        assert_eq!(scheduler.queued_count(), 1);
    }

    #[test]
    fn priority_ordering_is_ascending() {
        let scheduler = scheduler(4);
        scheduler.add(Request::seed("https://a.example/1").with_priority(10));
        scheduler.add(Request::seed("https://b.example/2").with_priority(5));
        scheduler.add(Request::seed("https://c.example/3").with_priority(20));

        let first = scheduler.next().unwrap();
        let second = scheduler.next().unwrap();
        let third = scheduler.next().unwrap();

        assert_eq!(first.url, "https://b.example/2");
        assert_eq!(second.url, "https://a.example/1");
        assert_eq!(third.url, "https://c.example/3");
    }

    #[test]
    fn depth_penalty_sinks_deep_requests() {
        let scheduler = scheduler(4);
        let deep = Request::seed("https://a.example/deep").with_priority(10).with_depth(2);
        scheduler.add(deep);
        scheduler.add(Request::seed("https://b.example/shallow").with_priority(5));

        let first = scheduler.next().unwrap();
        assert_eq!(first.url, "https://b.example/shallow");
    }

    #[test]
    fn ties_are_broken_fifo() {
        let scheduler = scheduler(4);
        scheduler.add(Request::seed("https://a.example/1"));
        scheduler.add(Request::seed("https://a.example/2"));

        assert_eq!(scheduler.next().unwrap().url, "https://a.example/1");
    }

    #[test]
    fn per_domain_delay_defers_second_request() {
        let scheduler = Scheduler::new(SchedulerConfig {
            allowed_domains: Vec::new(),
            blocked_patterns: Vec::new(),
            max_depth: 10,
            request_delay: Duration::from_secs(60),
            worker_count: 1,
            max_queue_size: None,
        });
        scheduler.add(Request::seed("https://a.example/1"));
        scheduler.add(Request::seed("https://a.example/2"));

        assert!(scheduler.next().is_some());
        assert!(scheduler.next().is_none());
    }

    #[test]
    fn empty_queue_returns_none() {
        let scheduler = scheduler(4);
        assert!(scheduler.next().is_none());
    }

    #[test]
    fn retry_bypasses_seen_set() {
        let scheduler = scheduler(4);
        let req = Request::seed("https://a.example/1");
        assert!(scheduler.add(req.clone()));
        assert!(!scheduler.add(req.clone()));
        assert!(scheduler.add_retry(req.next_attempt()));
        assert_eq!(scheduler.queued_count(), 2);
    }

    #[test]
    fn reset_clears_heap_and_seen_set() {
        let scheduler = scheduler(4);
        scheduler.add(Request::seed("https://a.example/1"));
        scheduler.next();
        scheduler.reset();
        assert_eq!(scheduler.queued_count(), 0);
        assert_eq!(scheduler.processed_count(), 0);
        assert!(scheduler.add(Request::seed("https://a.example/1")));
    }

    #[test]
    fn max_depth_filter_rejects_beyond_bound() {
        let scheduler = Scheduler::new(SchedulerConfig {
            allowed_domains: Vec::new(),
            blocked_patterns: Vec::new(),
            max_depth: 1,
            request_delay: Duration::from_millis(0),
            worker_count: 1,
            max_queue_size: None,
        });
        let parent = Request::seed("https://a.example/");
        let child1 = Request::child(&parent, "https://a.example/1");
        let child2 = Request::child(&child1, "https://a.example/2");
        assert!(scheduler.add(child1));
        assert!(!scheduler.add(child2));
    }

    #[test]
    fn queue_overflow_evicts_lowest_priority_entry() {
        let scheduler = Scheduler::new(SchedulerConfig {
            allowed_domains: Vec::new(),
            blocked_patterns: Vec::new(),
            max_depth: 10,
            request_delay: Duration::from_millis(0),
            worker_count: 1,
            max_queue_size: Some(2),
        });
        scheduler.add(Request::seed("https://a.example/1").with_priority(1));
        scheduler.add(Request::seed("https://a.example/2").with_priority(2));
        assert_eq!(scheduler.queued_count(), 2);

        scheduler.add(Request::seed("https://a.example/3").with_priority(3));
        assert_eq!(scheduler.queued_count(), 2);

        let first = scheduler.next().unwrap();
        let second = scheduler.next().unwrap();
        assert_eq!(first.url, "https://a.example/1");
        assert_eq!(second.url, "https://a.example/2");
        assert!(scheduler.next().is_none());
    }
}
