//! Configuration surface consumed by the crawl engine (spec §6).
//!
//! Loading a `CrawlConfiguration` from a file or CLI flags is explicitly out
//! of scope for the core — that is an external collaborator's job. What the
//! core owns is the DTO itself, its defaults, environment-variable
//! overrides, and validation, following the builder/env pattern the
//! teacher's `riptide-config` crate uses.

mod env;
mod error;
mod validate;

pub use env::load_from_env;
pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationStrategy {
    RoundRobin,
    Random,
    LeastUsed,
    HealthScore,
}

impl Default for RotationStrategy {
    fn default() -> Self {
        Self::RoundRobin
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxySettings {
    pub enabled: bool,
    pub proxy_urls: Vec<String>,
    pub rotation_strategy: RotationStrategy,
    pub test_interval_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSettings {
    pub enable_metrics: bool,
    pub metrics_interval_seconds: u32,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_interval_seconds: 30,
        }
    }
}

/// The configuration surface the engine consumes (spec §6 table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfiguration {
    pub max_concurrent_tasks: usize,
    pub max_depth: u32,
    pub max_pages: u64,
    /// Scheduler heap bound (spec §4.2 "Failure modes"). `None` leaves the
    /// queue unbounded; once set, overflow evicts the lowest-priority entry.
    pub max_queue_size: Option<usize>,
    pub request_delay: Duration,
    pub timeout_seconds: u64,
    pub allowed_domains: Vec<String>,
    pub blocked_patterns: Vec<String>,
    pub respect_robots_txt: bool,
    pub enable_anti_bot_detection: bool,
    pub memory_limit_mb: Option<u64>,
    pub retry_policy: RetryPolicy,
    pub proxy_settings: ProxySettings,
    pub monitoring_settings: MonitoringSettings,
    pub user_agent: String,
}

impl Default for CrawlConfiguration {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 10,
            max_depth: 5,
            max_pages: 10_000,
            max_queue_size: None,
            request_delay: Duration::from_millis(500),
            timeout_seconds: 30,
            allowed_domains: Vec::new(),
            blocked_patterns: Vec::new(),
            respect_robots_txt: true,
            enable_anti_bot_detection: true,
            memory_limit_mb: None,
            retry_policy: RetryPolicy::default(),
            proxy_settings: ProxySettings::default(),
            monitoring_settings: MonitoringSettings::default(),
            user_agent: "crawlforge/0.1 (+https://example.invalid/bot)".to_string(),
        }
    }
}

impl CrawlConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate::validate(self)
    }
}
