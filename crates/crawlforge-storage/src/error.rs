use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to persist {what} for key {key}: {reason}")]
    Write { what: &'static str, key: String, reason: String },

    #[error("failed to load {what} for key {key}: {reason}")]
    Read { what: &'static str, key: String, reason: String },
}
