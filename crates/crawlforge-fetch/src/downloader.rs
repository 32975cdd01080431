use crate::antibot::AntiBotDetector;
use crate::proxy::ProxyPool;
use crate::retry::backoff_delay;
use crate::robots::RobotsCache;
use crawlforge_config::CrawlConfiguration;
use crawlforge_types::{DownloadResult, ErrorKind, Request};
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{instrument, warn};

/// Extra cooldown applied to a host after an anti-bot response, on top of
/// the normal backoff delay (spec §4.3).
const ANTI_BOT_COOLDOWN: Duration = Duration::from_secs(5);

pub struct Downloader {
    client: Client,
    robots: Option<RobotsCache>,
    anti_bot: Option<AntiBotDetector>,
    proxy_pool: Option<ProxyPool>,
    timeout: Duration,
    retry_policy: crawlforge_config::RetryPolicy,
    user_agent: String,
}

impl Downloader {
    pub fn new(config: &CrawlConfiguration) -> Result<Self, crate::error::FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| crate::error::FetchError::ClientBuild(e.to_string()))?;

        let robots = config
            .respect_robots_txt
            .then(|| RobotsCache::new(config.user_agent.clone(), Duration::from_secs(3600)));

        let anti_bot = config.enable_anti_bot_detection.then(AntiBotDetector::default);

        let proxy_pool = config.proxy_settings.enabled.then(|| {
            ProxyPool::new(
                config.proxy_settings.proxy_urls.clone(),
                config.proxy_settings.rotation_strategy,
            )
        });

        Ok(Self {
            client,
            robots,
            anti_bot,
            proxy_pool,
            timeout: Duration::from_secs(config.timeout_seconds),
            retry_policy: config.retry_policy.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Fetch `request`, retrying retryable failures in place up to
    /// `RetryPolicy::max_retries`. `cancel` is the engine-wide shutdown
    /// signal; it aborts an in-flight attempt immediately when it flips.
    #[instrument(skip(self, cancel), fields(url = %request.url))]
    pub async fn download(&self, request: &Request, cancel: &watch::Receiver<bool>) -> DownloadResult {
        if self.robots.is_some() {
            let allowed = self
                .robots
                .as_ref()
                .unwrap()
                .is_allowed(&self.client, &request.url)
                .await;
            if !allowed {
                return DownloadResult::failure(
                    request.url.clone(),
                    request.id(),
                    0,
                    ErrorKind::RobotsDisallowed,
                    "disallowed by robots.txt",
                    0,
                );
            }
        }

        let mut attempt = 0;
        loop {
            let started = Instant::now();
            let proxy_url = self.proxy_pool.as_ref().and_then(|pool| pool.select());
            let outcome = self.attempt_once(request, proxy_url.as_deref(), cancel).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    if let (Some(pool), Some(proxy)) = (&self.proxy_pool, &proxy_url) {
                        pool.record_success(proxy);
                    }
                    return result;
                }
                Err((kind, message, extra_cooldown, status)) => {
                    if let (Some(pool), Some(proxy)) = (&self.proxy_pool, &proxy_url) {
                        pool.record_failure(proxy);
                    }
                    let retryable = is_retryable_failure(kind, status);
                    if !retryable || attempt >= self.retry_policy.max_retries {
                        return DownloadResult::failure(
                            request.url.clone(),
                            request.id(),
                            status,
                            kind,
                            message,
                            elapsed_ms,
                        );
                    }
                    let mut delay = backoff_delay(&self.retry_policy, attempt);
                    if extra_cooldown {
                        delay += ANTI_BOT_COOLDOWN;
                    }
                    warn!(url = %request.url, attempt, delay_ms = delay.as_millis(), ?kind, "retrying download");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// `Err` carries (kind, message, extra_cooldown, http status or 0 for
    /// transport-level failures with no response).
    async fn attempt_once(
        &self,
        request: &Request,
        proxy_url: Option<&str>,
        cancel: &watch::Receiver<bool>,
    ) -> Result<DownloadResult, (ErrorKind, String, bool, u16)> {
        if *cancel.borrow() {
            return Err((ErrorKind::Network, "cancelled".to_string(), false, 0));
        }

        let client = match proxy_url {
            Some(url) => self.client_with_proxy(url)?,
            None => self.client.clone(),
        };

        let mut builder = match request.method {
            crawlforge_types::HttpMethod::Get => client.get(&request.url),
            crawlforge_types::HttpMethod::Post => client.post(&request.url),
            crawlforge_types::HttpMethod::Head => client.head(&request.url),
            crawlforge_types::HttpMethod::Put => client.put(&request.url),
            crawlforge_types::HttpMethod::Delete => client.delete(&request.url),
        };
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(referrer) = &request.referrer {
            builder = builder.header("Referer", referrer);
        }

        let mut cancel = cancel.clone();
        let send_future = builder.send();
        let response = tokio::select! {
            result = tokio::time::timeout(self.timeout, send_future) => {
                match result {
                    Ok(Ok(response)) => response,
                    Ok(Err(err)) => {
                        return Err((classify_reqwest_error(&err), err.to_string(), false, 0));
                    }
                    Err(_) => return Err((ErrorKind::Timeout, "request timed out".to_string(), false, 0)),
                }
            }
            _ = cancel.changed() => {
                return Err((ErrorKind::Network, "cancelled".to_string(), false, 0));
            }
        };

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let content_type = headers.get("content-type").cloned();

        let body = response.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        let text = String::from_utf8(body.clone()).ok();

        if let Some(detector) = &self.anti_bot {
            if detector.looks_like_anti_bot(status, text.as_deref().unwrap_or_default()) {
                return Err((ErrorKind::AntiBot, format!("anti-bot response (status {status})"), true, status));
            }
        }

        if !(200..400).contains(&status) {
            let kind = classify_status(status);
            return Err((kind, format!("http status {status}"), false, status));
        }

        Ok(DownloadResult::success(
            request.url.clone(),
            request.id(),
            body,
            text,
            content_type,
            status,
            headers,
            0,
        ))
    }

    fn client_with_proxy(&self, proxy_url: &str) -> Result<Client, (ErrorKind, String, bool, u16)> {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| (ErrorKind::Network, format!("invalid proxy {proxy_url}: {e}"), false, 0))?;
        Client::builder()
            .user_agent(&self.user_agent)
            .proxy(proxy)
            .timeout(self.timeout)
            .build()
            .map_err(|e| (ErrorKind::Network, e.to_string(), false, 0))
    }
}

/// HTTP status → taxonomy kind (spec §7): 408/429 stay `Http4xx` (the spec
/// names no separate kind for them), but remain retryable — see
/// `is_retryable_failure`, which is the single place that decision is made.
fn classify_status(status: u16) -> ErrorKind {
    match status {
        400..=499 => ErrorKind::Http4xx,
        500..=599 => ErrorKind::Http5xx,
        _ => ErrorKind::Network,
    }
}

/// Retry eligibility (spec §4.3): network/timeout/5xx/anti-bot are always
/// retryable; `Http4xx` is retryable only for 408 (timeout) and 429 (rate
/// limit), never for other 4xx statuses.
fn is_retryable_failure(kind: ErrorKind, status: u16) -> bool {
    kind.is_retryable() || (kind == ErrorKind::Http4xx && matches!(status, 408 | 429))
}

fn classify_reqwest_error(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else {
        ErrorKind::Network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlforge_types::Request;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> CrawlConfiguration {
        let mut config = CrawlConfiguration::default();
        config.respect_robots_txt = false;
        config.enable_anti_bot_detection = false;
        config.retry_policy.initial_delay = Duration::from_millis(1);
        config.retry_policy.max_delay = Duration::from_millis(5);
        config
    }

    #[tokio::test]
    async fn successful_download_reports_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let downloader = Downloader::new(&config()).unwrap();
        let (_tx, rx) = watch::channel(false);
        let request = Request::seed(server.uri());
        let result = downloader.download(&request, &rx).await;

        assert!(result.success);
        assert_eq!(result.status, 200);
        assert_eq!(result.text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn server_error_retries_until_cap_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut cfg = config();
        cfg.retry_policy.max_retries = 2;
        let downloader = Downloader::new(&cfg).unwrap();
        let (_tx, rx) = watch::channel(false);
        let request = Request::seed(server.uri());
        let result = downloader.download(&request, &rx).await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Http5xx));
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let downloader = Downloader::new(&config()).unwrap();
        let (_tx, rx) = watch::channel(false);
        let request = Request::seed(server.uri());
        let result = downloader.download(&request, &rx).await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Http4xx));
    }

    #[tokio::test]
    async fn rate_limited_is_retried_but_labeled_http_4xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let mut cfg = config();
        cfg.retry_policy.max_retries = 2;
        let downloader = Downloader::new(&cfg).unwrap();
        let (_tx, rx) = watch::channel(false);
        let request = Request::seed(server.uri());
        let result = downloader.download(&request, &rx).await;

        assert!(!result.success);
        assert_eq!(result.status, 429);
        assert_eq!(result.error_kind, Some(ErrorKind::Http4xx));
        assert_eq!(result.error_kind.unwrap().to_string(), "http_4xx");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3, "initial attempt plus 2 retries");
    }
}
