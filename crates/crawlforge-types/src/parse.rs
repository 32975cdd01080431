use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of a single `Parser::parse` call.
///
/// Invariant: discovered links are absolute URLs; `title` is trimmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub url: String,
    pub links: Vec<String>,
    pub extracted: HashMap<String, serde_json::Value>,
    pub title: String,
    pub text_body: String,
    pub image_urls: Vec<String>,
    pub content_type: Option<String>,
    pub parse_time_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl ParseResult {
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            links: Vec::new(),
            extracted: HashMap::new(),
            title: String::new(),
            text_body: String::new(),
            image_urls: Vec::new(),
            content_type: None,
            parse_time_ms: 0,
            success: true,
            error_message: None,
        }
    }
}
