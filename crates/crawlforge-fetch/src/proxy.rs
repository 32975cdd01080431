use crawlforge_config::RotationStrategy;
use rand::Rng;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

const UNHEALTHY_THRESHOLD: u32 = 3;

struct ProxyEntry {
    url: String,
    failure_count: AtomicU32,
    in_use_count: AtomicU32,
    healthy: Mutex<bool>,
}

/// Rotates through a configured set of proxy URLs, skipping any marked
/// unhealthy after `UNHEALTHY_THRESHOLD` consecutive failures until the
/// next health check restores them.
pub struct ProxyPool {
    entries: Vec<ProxyEntry>,
    strategy: RotationStrategy,
    round_robin_cursor: AtomicUsize,
}

impl ProxyPool {
    pub fn new(proxy_urls: Vec<String>, strategy: RotationStrategy) -> Self {
        let entries = proxy_urls
            .into_iter()
            .map(|url| ProxyEntry {
                url,
                failure_count: AtomicU32::new(0),
                in_use_count: AtomicU32::new(0),
                healthy: Mutex::new(true),
            })
            .collect();
        Self {
            entries,
            strategy,
            round_robin_cursor: AtomicUsize::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick the next proxy URL to use for an attempt, per the configured
    /// strategy. Returns `None` if every proxy is unhealthy.
    pub fn select(&self) -> Option<String> {
        let healthy: Vec<&ProxyEntry> = self
            .entries
            .iter()
            .filter(|e| *e.healthy.lock().expect("proxy pool lock poisoned"))
            .collect();
        if healthy.is_empty() {
            return None;
        }

        let chosen = match self.strategy {
            RotationStrategy::RoundRobin => {
                let index = self.round_robin_cursor.fetch_add(1, Ordering::SeqCst) % healthy.len();
                healthy[index]
            }
            RotationStrategy::Random => {
                let index = rand::thread_rng().gen_range(0..healthy.len());
                healthy[index]
            }
            RotationStrategy::LeastUsed => healthy
                .iter()
                .min_by_key(|e| e.in_use_count.load(Ordering::SeqCst))
                .copied()
                .expect("healthy is non-empty"),
            RotationStrategy::HealthScore => healthy
                .iter()
                .min_by_key(|e| e.failure_count.load(Ordering::SeqCst))
                .copied()
                .expect("healthy is non-empty"),
        };

        chosen.in_use_count.fetch_add(1, Ordering::SeqCst);
        Some(chosen.url.clone())
    }

    pub fn record_failure(&self, proxy_url: &str) {
        if let Some(entry) = self.entries.iter().find(|e| e.url == proxy_url) {
            let failures = entry.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
            if failures >= UNHEALTHY_THRESHOLD {
                *entry.healthy.lock().expect("proxy pool lock poisoned") = false;
            }
        }
    }

    pub fn record_success(&self, proxy_url: &str) {
        if let Some(entry) = self.entries.iter().find(|e| e.url == proxy_url) {
            entry.failure_count.store(0, Ordering::SeqCst);
        }
    }

    /// Restore every proxy to healthy, to be called on a periodic timer.
    pub fn run_health_check(&self) {
        for entry in &self.entries {
            *entry.healthy.lock().expect("proxy pool lock poisoned") = true;
            entry.failure_count.store(0, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_cycles_through_all_proxies() {
        let pool = ProxyPool::new(
            vec!["p1".into(), "p2".into(), "p3".into()],
            RotationStrategy::RoundRobin,
        );
        let selections: Vec<_> = (0..3).map(|_| pool.select().unwrap()).collect();
        assert_eq!(selections, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn repeated_failures_mark_proxy_unhealthy() {
        let pool = ProxyPool::new(vec!["p1".into()], RotationStrategy::RoundRobin);
        for _ in 0..UNHEALTHY_THRESHOLD {
            pool.record_failure("p1");
        }
        assert!(pool.select().is_none());
    }

    #[test]
    fn health_check_restores_unhealthy_proxies() {
        let pool = ProxyPool::new(vec!["p1".into()], RotationStrategy::RoundRobin);
        for _ in 0..UNHEALTHY_THRESHOLD {
            pool.record_failure("p1");
        }
        assert!(pool.select().is_none());
        pool.run_health_check();
        assert_eq!(pool.select().as_deref(), Some("p1"));
    }

    #[test]
    fn empty_pool_reports_empty() {
        let pool = ProxyPool::new(Vec::new(), RotationStrategy::RoundRobin);
        assert!(pool.is_empty());
        assert!(pool.select().is_none());
    }
}
