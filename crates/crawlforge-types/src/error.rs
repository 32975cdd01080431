use serde::{Deserialize, Serialize};

/// Error taxonomy carried on `DownloadResult::error_kind` and in
/// `CrawlError` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// DNS, TCP, TLS. Retryable.
    Network,
    /// Per-request deadline exceeded. Retryable.
    Timeout,
    /// Non-retryable client error, except 408/429.
    Http4xx,
    /// Server error. Retryable.
    Http5xx,
    /// Anti-bot challenge detected. Retryable with extra cooldown.
    AntiBot,
    /// Disallowed by robots.txt. Terminal, no retry.
    RobotsDisallowed,
    /// URL could not be parsed. Terminal, never enqueued.
    InvalidUrl,
    /// Recorded on `ParseResult`, does not fail the `CrawlResult`.
    ParseError,
    /// Logged and surfaced as an event; does not halt the engine.
    StorageError,
    /// Terminal at `Engine::start`.
    ConfigError,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Http5xx | ErrorKind::AntiBot
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Http4xx => "http_4xx",
            ErrorKind::Http5xx => "http_5xx",
            ErrorKind::AntiBot => "anti_bot",
            ErrorKind::RobotsDisallowed => "robots_disallowed",
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::StorageError => "storage_error",
            ErrorKind::ConfigError => "config_error",
        };
        write!(f, "{s}")
    }
}
