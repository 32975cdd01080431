//! Environment variable overlay, grounded on the teacher's `EnvConfigLoader`.
//!
//! Everything is prefixed `CRAWLFORGE_`. Only fields that make sense to flip
//! per-deployment are exposed; structural settings like the retry policy or
//! proxy list stay in the config file/builder and are left untouched here.

use crate::{ConfigError, CrawlConfiguration};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

struct EnvConfigLoader {
    prefix: String,
    defaults: HashMap<String, String>,
}

impl EnvConfigLoader {
    fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            defaults: HashMap::new(),
        }
    }

    fn default(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(var.into(), value.into());
        self
    }

    fn make_var_name(&self, var: &str) -> String {
        format!("{}{}", self.prefix, var.to_uppercase())
    }

    fn get_optional(&self, var: &str) -> Option<String> {
        let full_var = self.make_var_name(var);
        env::var(&full_var).ok().or_else(|| self.defaults.get(var).cloned())
    }

    fn get_uint(&self, var: &str) -> Result<Option<u64>, ConfigError> {
        match self.get_optional(var) {
            Some(raw) => raw
                .parse::<u64>()
                .map(Some)
                .map_err(|e| ConfigError::EnvInvalid {
                    var: self.make_var_name(var),
                    reason: format!("not an unsigned integer: {e}"),
                }),
            None => Ok(None),
        }
    }

    fn get_bool(&self, var: &str) -> Result<Option<bool>, ConfigError> {
        match self.get_optional(var) {
            Some(raw) => match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                other => Err(ConfigError::EnvInvalid {
                    var: self.make_var_name(var),
                    reason: format!("not a boolean: {other}"),
                }),
            },
            None => Ok(None),
        }
    }

    fn get_list(&self, var: &str) -> Option<Vec<String>> {
        self.get_optional(var).map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

/// Start from `CrawlConfiguration::default()`, overlay any `CRAWLFORGE_*`
/// environment variables present, then validate.
pub fn load_from_env() -> Result<CrawlConfiguration, ConfigError> {
    let loader = EnvConfigLoader::new("CRAWLFORGE_").default("max_concurrent_tasks", "10");
    let mut config = CrawlConfiguration::default();

    if let Some(v) = loader.get_uint("max_concurrent_tasks")? {
        config.max_concurrent_tasks = v as usize;
    }
    if let Some(v) = loader.get_uint("max_depth")? {
        config.max_depth = v as u32;
    }
    if let Some(v) = loader.get_uint("max_pages")? {
        config.max_pages = v;
    }
    if let Some(v) = loader.get_uint("request_delay_ms")? {
        config.request_delay = Duration::from_millis(v);
    }
    if let Some(v) = loader.get_uint("timeout_seconds")? {
        config.timeout_seconds = v;
    }
    if let Some(v) = loader.get_bool("respect_robots_txt")? {
        config.respect_robots_txt = v;
    }
    if let Some(v) = loader.get_bool("enable_anti_bot_detection")? {
        config.enable_anti_bot_detection = v;
    }
    if let Some(v) = loader.get_uint("memory_limit_mb")? {
        config.memory_limit_mb = Some(v);
    }
    if let Some(list) = loader.get_list("allowed_domains") {
        config.allowed_domains = list;
    }
    if let Some(list) = loader.get_list("blocked_patterns") {
        config.blocked_patterns = list;
    }
    if let Some(ua) = loader.get_optional("user_agent") {
        config.user_agent = ua;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_are_used_when_no_env_vars_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = load_from_env().unwrap();
        assert_eq!(config.max_concurrent_tasks, 10);
    }

    #[test]
    fn overlay_applies_prefixed_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("CRAWLFORGE_MAX_DEPTH", "9");
        env::set_var("CRAWLFORGE_ALLOWED_DOMAINS", "a.example, b.example");

        let config = load_from_env().unwrap();

        assert_eq!(config.max_depth, 9);
        assert_eq!(config.allowed_domains, vec!["a.example", "b.example"]);

        env::remove_var("CRAWLFORGE_MAX_DEPTH");
        env::remove_var("CRAWLFORGE_ALLOWED_DOMAINS");
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("CRAWLFORGE_RESPECT_ROBOTS_TXT", "maybe");
        assert!(load_from_env().is_err());
        env::remove_var("CRAWLFORGE_RESPECT_ROBOTS_TXT");
    }
}
