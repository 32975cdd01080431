use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("robots.txt fetch failed for {host}: {reason}")]
    RobotsFetch { host: String, reason: String },
}
