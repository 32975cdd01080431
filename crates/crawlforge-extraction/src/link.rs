use crate::extractor::{ContentExtractor, ExtractOutcome};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::trace;
use url::Url;

/// Selects `a[href]` and resolves relative references against the document
/// URL; also collects `img[src]` as `Image_N` data entries (spec §4.4).
pub struct LinkExtractor;

impl ContentExtractor for LinkExtractor {
    fn name(&self) -> &str {
        "link"
    }

    fn extract(&self, document: &Html, base_url: &str) -> ExtractOutcome {
        let mut outcome = ExtractOutcome::new();
        let Ok(base) = Url::parse(base_url) else {
            outcome
                .data
                .insert("error".to_string(), Value::String(format!("invalid base url: {base_url}")));
            return outcome;
        };

        let anchor_selector = Selector::parse("a[href]").expect("static selector is valid");
        for element in document.select(&anchor_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            match base.join(href) {
                Ok(resolved) => outcome.links.push(resolved.to_string()),
                Err(err) => trace!(href, %err, "skipping unresolvable link"),
            }
        }

        let image_selector = Selector::parse("img[src]").expect("static selector is valid");
        for (index, element) in document.select(&image_selector).enumerate() {
            let Some(src) = element.value().attr("src") else {
                continue;
            };
            if let Ok(resolved) = base.join(src) {
                outcome
                    .data
                    .insert(format!("Image_{index}"), Value::String(resolved.to_string()));
            }
        }

        outcome
    }
}
