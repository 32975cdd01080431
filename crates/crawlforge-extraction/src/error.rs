use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("document body is not valid UTF-8")]
    InvalidEncoding,
}
