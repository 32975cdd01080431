use crate::content::{extract_visible_text, BodyContentExtractor};
use crate::extractor::ExtractorRegistry;
use crate::link::LinkExtractor;
use crate::metadata::MetadataExtractor;
use crawlforge_types::{DownloadResult, ParseResult};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{instrument, warn};

const JSON_TITLE: &str = "JSON Data";
const TEXT_SUMMARY_LEN: usize = 100;

/// Content-type dispatching extractor pipeline (spec §4.4): routes a
/// `DownloadResult` to the HTML/text/JSON/binary handling it calls for; for
/// HTML, parses the document and runs every registered extractor over it
/// inside a single blocking task.
pub struct Parser {
    registry: ExtractorRegistry,
}

impl Default for Parser {
    fn default() -> Self {
        let mut registry = ExtractorRegistry::new();
        registry
            .register(Arc::new(LinkExtractor))
            .register(Arc::new(MetadataExtractor))
            .register(Arc::new(BodyContentExtractor));
        Self { registry }
    }
}

impl Parser {
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    #[instrument(skip(self, download), fields(url = %download.url))]
    pub async fn parse(&self, download: &DownloadResult) -> ParseResult {
        let started = Instant::now();
        let content_type = download
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        let mut result = if content_type == "text/html" {
            self.parse_html(download).await
        } else if content_type.starts_with("text/") {
            parse_text(download)
        } else if content_type == "application/json" {
            parse_json(download)
        } else {
            parse_binary(download, &content_type)
        };

        result.content_type = download.content_type.clone();
        result.parse_time_ms = started.elapsed().as_millis() as u64;
        result
    }

    /// `scraper::Html` is not `Send` (its tree holds non-atomic string
    /// tendrils), so it can never be shared across a `spawn_blocking`
    /// boundary or held across an `.await`. The document is parsed and every
    /// extractor run to completion inside a single blocking task, which
    /// returns only the owned, `Send` pieces of a `ParseResult`.
    async fn parse_html(&self, download: &DownloadResult) -> ParseResult {
        let Some(body) = &download.text else {
            return failed(download, "html response had no decoded text body");
        };
        let body = body.clone();
        let url = download.url.clone();
        let extractors: Vec<_> = self.registry.extractors().to_vec();

        let parsed = tokio::task::spawn_blocking(move || {
            let document = Html::parse_document(&body);

            let title_selector = Selector::parse("title").expect("static selector is valid");
            let title = document
                .select(&title_selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            let text_body = extract_visible_text(&document);

            let mut links = Vec::new();
            let mut extracted = HashMap::new();
            let mut extractors_run = Vec::new();
            for extractor in &extractors {
                let outcome = extractor.extract(&document, &url);
                links.extend(outcome.links);
                extracted.extend(outcome.data);
                extractors_run.push(serde_json::Value::String(extractor.name().to_string()));
            }

            (title, text_body, links, extracted, extractors_run)
        })
        .await;

        match parsed {
            Ok((title, text_body, links, extracted, extractors_run)) => {
                let mut result = ParseResult::empty(download.url.clone());
                result.title = title;
                result.text_body = text_body;
                result.links = links;
                result.extracted = extracted;
                result
                    .extracted
                    .insert("extractors_run".to_string(), serde_json::Value::Array(extractors_run));
                result
            }
            Err(err) => {
                warn!(%err, "html parse task panicked");
                failed(download, "html parsing task panicked")
            }
        }
    }
}

fn parse_text(download: &DownloadResult) -> ParseResult {
    let body = download.text.clone().unwrap_or_default();
    let mut result = ParseResult::empty(download.url.clone());
    let title: String = body.chars().take(TEXT_SUMMARY_LEN).collect();
    result.title = if body.chars().count() > TEXT_SUMMARY_LEN {
        format!("{title}...")
    } else {
        title
    };
    result.text_body = body;
    result
}

fn parse_json(download: &DownloadResult) -> ParseResult {
    let mut result = ParseResult::empty(download.url.clone());
    result.title = JSON_TITLE.to_string();
    let raw = download.text.clone().unwrap_or_default();
    let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
    result.extracted.insert("json".to_string(), value);
    result
}

fn parse_binary(download: &DownloadResult, content_type: &str) -> ParseResult {
    let mut result = ParseResult::empty(download.url.clone());
    let label = if content_type.is_empty() { "unknown" } else { content_type };
    result.title = format!("{label} Data");
    result
        .extracted
        .insert("raw".to_string(), serde_json::Value::String(String::from_utf8_lossy(&download.raw_bytes).into_owned()));
    result
}

fn failed(download: &DownloadResult, message: &str) -> ParseResult {
    let mut result = ParseResult::empty(download.url.clone());
    result.success = false;
    result.error_message = Some(message.to_string());
    result
}
