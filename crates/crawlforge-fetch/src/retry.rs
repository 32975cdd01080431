use crawlforge_config::RetryPolicy;
use rand::Rng;
use std::time::Duration;

/// `InitialDelay * BackoffMultiplier^attempt`, clamped at `MaxDelay`, plus
/// ±20% jitter (spec §4.3).
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base_ms = policy.initial_delay.as_millis() as f64 * policy.backoff_multiplier.powi(attempt as i32);
    let capped = Duration::from_millis(base_ms as u64).min(policy.max_delay);

    let jitter_fraction = rand::thread_rng().gen_range(-0.2..=0.2);
    let jittered_ms = (capped.as_millis() as f64 * (1.0 + jitter_fraction)).max(0.0);
    Duration::from_millis(jittered_ms as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }

    #[test]
    fn delay_grows_exponentially_within_jitter_band() {
        let p = policy();
        let d0 = backoff_delay(&p, 0);
        let d2 = backoff_delay(&p, 2);
        assert!(d0.as_millis() >= 80 && d0.as_millis() <= 120);
        assert!(d2.as_millis() >= 320 && d2.as_millis() <= 480);
    }

    #[test]
    fn delay_is_capped_at_max_delay() {
        let p = policy();
        let delay = backoff_delay(&p, 20);
        assert!(delay <= p.max_delay + p.max_delay / 5);
    }
}
