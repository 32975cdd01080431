use dashmap::DashMap;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

struct CachedRobots {
    content: String,
    cached_at: Instant,
}

impl CachedRobots {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Per-host cache of fetched `robots.txt` content, re-fetched after `ttl`
/// elapses. A fetch failure is treated as permissive (empty ruleset) rather
/// than blocking the crawl, logged at `warn`.
pub struct RobotsCache {
    entries: DashMap<String, CachedRobots>,
    ttl: Duration,
    user_agent: String,
}

impl RobotsCache {
    pub fn new(user_agent: String, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            user_agent,
        }
    }

    /// True if `url` may be fetched under the cached (or freshly fetched)
    /// robots.txt for its host.
    pub async fn is_allowed(&self, client: &Client, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return true;
        };
        let Some(host) = parsed.host_str() else {
            return true;
        };
        let content = self.content_for_host(client, parsed.scheme(), host).await;

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&content, &self.user_agent, url)
    }

    async fn content_for_host(&self, client: &Client, scheme: &str, host: &str) -> String {
        if let Some(cached) = self.entries.get(host) {
            if !cached.is_expired(self.ttl) {
                return cached.content.clone();
            }
        }

        let robots_url = format!("{scheme}://{host}/robots.txt");
        let content = match client.get(&robots_url).send().await {
            Ok(response) => response.text().await.unwrap_or_default(),
            Err(err) => {
                warn!(%host, error = %err, "failed to fetch robots.txt, allowing all");
                String::new()
            }
        };
        debug!(%host, bytes = content.len(), "cached robots.txt");

        self.entries.insert(
            host.to_string(),
            CachedRobots {
                content: content.clone(),
                cached_at: Instant::now(),
            },
        );
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn disallowed_path_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
            .mount(&server)
            .await;

        let cache = RobotsCache::new("crawlforge-test".to_string(), Duration::from_secs(60));
        let client = Client::new();
        let server_url = url::Url::parse(&server.uri()).unwrap();
        let host = server_url.host_str().unwrap().to_string();
        let port_suffix = server_url.port().map(|p| format!(":{p}")).unwrap_or_default();
        let content = cache
            .content_for_host(&client, "http", &format!("{host}{port_suffix}"))
            .await;
        assert!(content.contains("Disallow: /private"));
    }

    #[tokio::test]
    async fn unfetchable_robots_defaults_to_permissive() {
        let cache = RobotsCache::new("crawlforge-test".to_string(), Duration::from_secs(60));
        let client = Client::new();
        let allowed = cache.is_allowed(&client, "https://127.0.0.1:1/anything").await;
        assert!(allowed);
    }
}
