use std::time::{Duration, Instant};

/// EWMA smoothing factor applied on every `record` call.
const EWMA_ALPHA: f64 = 0.3;

/// Latency/success-rate penalty clamp (spec §4.2 "clamped").
const MAX_SLOWDOWN: i64 = 20;
const MIN_SLOWDOWN: i64 = -5;

/// Per-host bookkeeping: last access time for rate limiting, plus an EWMA
/// of observed latency and success rate for adaptive priority.
#[derive(Debug, Clone)]
pub struct DomainRecord {
    pub last_access: Option<Instant>,
    pub required_delay: Duration,
    avg_latency_ms: f64,
    success_rate: f64,
    samples: u32,
}

impl Default for DomainRecord {
    fn default() -> Self {
        Self {
            last_access: None,
            required_delay: Duration::from_millis(0),
            avg_latency_ms: 0.0,
            success_rate: 1.0,
            samples: 0,
        }
    }
}

impl DomainRecord {
    pub fn ready(&self, now: Instant) -> bool {
        match self.last_access {
            Some(last) => now.duration_since(last) >= self.required_delay,
            None => true,
        }
    }

    pub fn time_until_ready(&self, now: Instant) -> Duration {
        match self.last_access {
            Some(last) => {
                let elapsed = now.duration_since(last);
                self.required_delay.saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        }
    }

    pub fn mark_accessed(&mut self, now: Instant) {
        self.last_access = Some(now);
    }

    /// Fold a fresh (latency, success) sample into the EWMA.
    pub fn record(&mut self, latency_ms: f64, success: bool) {
        let success_value = if success { 1.0 } else { 0.0 };
        if self.samples == 0 {
            self.avg_latency_ms = latency_ms;
            self.success_rate = success_value;
        } else {
            self.avg_latency_ms = EWMA_ALPHA * latency_ms + (1.0 - EWMA_ALPHA) * self.avg_latency_ms;
            self.success_rate = EWMA_ALPHA * success_value + (1.0 - EWMA_ALPHA) * self.success_rate;
        }
        self.samples += 1;
    }

    /// Additive priority penalty for this domain: higher latency and lower
    /// success push the penalty up; consistently fast, healthy domains earn
    /// a small negative bonus. Clamped to `[MIN_SLOWDOWN, MAX_SLOWDOWN]`.
    pub fn slowdown(&self) -> i64 {
        if self.samples == 0 {
            return 0;
        }
        let latency_term = (self.avg_latency_ms / 500.0) as i64;
        let failure_term = ((1.0 - self.success_rate) * 15.0) as i64;
        (latency_term + failure_term - 2).clamp(MIN_SLOWDOWN, MAX_SLOWDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_always_ready() {
        let record = DomainRecord::default();
        assert!(record.ready(Instant::now()));
    }

    #[test]
    fn required_delay_defers_readiness() {
        let mut record = DomainRecord::default();
        record.required_delay = Duration::from_millis(500);
        let now = Instant::now();
        record.mark_accessed(now);
        assert!(!record.ready(now));
    }

    #[test]
    fn healthy_fast_domain_gets_bonus_not_penalty() {
        let mut record = DomainRecord::default();
        for _ in 0..5 {
            record.record(50.0, true);
        }
        assert!(record.slowdown() <= 0);
    }

    #[test]
    fn slow_unreliable_domain_gets_penalty() {
        let mut record = DomainRecord::default();
        for _ in 0..5 {
            record.record(4000.0, false);
        }
        assert!(record.slowdown() > 0);
    }

    #[test]
    fn slowdown_is_clamped() {
        let mut record = DomainRecord::default();
        for _ in 0..10 {
            record.record(50_000.0, false);
        }
        assert_eq!(record.slowdown(), MAX_SLOWDOWN);
    }
}
