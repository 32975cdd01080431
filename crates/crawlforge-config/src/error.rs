use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error("environment variable {var} not found")]
    EnvNotFound { var: String },

    #[error("environment variable {var} has invalid value: {reason}")]
    EnvInvalid { var: String, reason: String },
}
