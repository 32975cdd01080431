use thiserror::Error;

/// Terminal errors at `Engine::start` (spec §7 `ConfigError`).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] crawlforge_config::ConfigError),

    #[error("failed to build downloader: {0}")]
    DownloaderInit(#[from] crawlforge_fetch::FetchError),

    #[error("cannot start engine from status {0:?}, only Idle accepts Start")]
    InvalidStartState(crawlforge_types::CrawlerStatus),
}
