use crate::{CrawlConfiguration, ConfigError};

pub(crate) fn validate(config: &CrawlConfiguration) -> Result<(), ConfigError> {
    if config.max_concurrent_tasks == 0 {
        return Err(ConfigError::Invalid {
            reason: "max_concurrent_tasks must be at least 1".to_string(),
        });
    }
    if config.max_pages == 0 {
        return Err(ConfigError::Invalid {
            reason: "max_pages must be at least 1".to_string(),
        });
    }
    if config.max_queue_size == Some(0) {
        return Err(ConfigError::Invalid {
            reason: "max_queue_size must be omitted or at least 1".to_string(),
        });
    }
    if config.timeout_seconds == 0 {
        return Err(ConfigError::Invalid {
            reason: "timeout_seconds must be at least 1".to_string(),
        });
    }
    if config.retry_policy.backoff_multiplier < 1.0 {
        return Err(ConfigError::Invalid {
            reason: "retry_policy.backoff_multiplier must be >= 1.0".to_string(),
        });
    }
    if config.retry_policy.max_delay < config.retry_policy.initial_delay {
        return Err(ConfigError::Invalid {
            reason: "retry_policy.max_delay must be >= initial_delay".to_string(),
        });
    }
    if config.proxy_settings.enabled && config.proxy_settings.proxy_urls.is_empty() {
        return Err(ConfigError::Invalid {
            reason: "proxy_settings.enabled is true but proxy_urls is empty".to_string(),
        });
    }
    if let Some(limit) = config.memory_limit_mb {
        if limit == 0 {
            return Err(ConfigError::Invalid {
                reason: "memory_limit_mb must be omitted or at least 1".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_concurrency() {
        let mut config = CrawlConfiguration::default();
        config.max_concurrent_tasks = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_proxy_enabled_without_urls() {
        let mut config = CrawlConfiguration::default();
        config.proxy_settings.enabled = true;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_inverted_retry_delays() {
        let mut config = CrawlConfiguration::default();
        config.retry_policy.initial_delay = std::time::Duration::from_secs(60);
        assert!(validate(&config).is_err());
    }
}
