use crate::error::ErrorKind;
use crate::request::RequestId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of a single `Downloader::download` call.
///
/// Invariant: `success` implies `200 <= status < 400`. On failure, `body`
/// may be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    pub url: String,
    pub request_id: RequestId,
    pub raw_bytes: Vec<u8>,
    pub text: Option<String>,
    pub content_type: Option<String>,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub download_time_ms: u64,
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
}

impl DownloadResult {
    pub fn success(
        url: impl Into<String>,
        request_id: RequestId,
        raw_bytes: Vec<u8>,
        text: Option<String>,
        content_type: Option<String>,
        status: u16,
        headers: HashMap<String, String>,
        download_time_ms: u64,
    ) -> Self {
        debug_assert!((200..400).contains(&status));
        Self {
            url: url.into(),
            request_id,
            raw_bytes,
            text,
            content_type,
            status,
            headers,
            download_time_ms,
            success: true,
            error_kind: None,
            error_message: None,
        }
    }

    pub fn failure(
        url: impl Into<String>,
        request_id: RequestId,
        status: u16,
        error_kind: ErrorKind,
        error_message: impl Into<String>,
        download_time_ms: u64,
    ) -> Self {
        Self {
            url: url.into(),
            request_id,
            raw_bytes: Vec::new(),
            text: None,
            content_type: None,
            status,
            headers: HashMap::new(),
            download_time_ms,
            success: false,
            error_kind: Some(error_kind),
            error_message: Some(error_message.into()),
        }
    }
}
