use crate::extractor::{ContentExtractor, ExtractOutcome};
use scraper::{Html, Selector};
use serde_json::Value;

/// Reads every `<meta name|property>` into `Meta_<name>`, plus the page
/// title, description and keywords (spec §4.4).
pub struct MetadataExtractor;

impl ContentExtractor for MetadataExtractor {
    fn name(&self) -> &str {
        "metadata"
    }

    fn extract(&self, document: &Html, _base_url: &str) -> ExtractOutcome {
        let mut outcome = ExtractOutcome::new();

        let meta_selector = Selector::parse("meta").expect("static selector is valid");
        for element in document.select(&meta_selector) {
            let attrs = element.value();
            let Some(name) = attrs.attr("name").or_else(|| attrs.attr("property")) else {
                continue;
            };
            let Some(content) = attrs.attr("content") else {
                continue;
            };
            outcome
                .data
                .insert(format!("Meta_{name}"), Value::String(content.to_string()));
        }

        if let Some(title_selector) = Selector::parse("title").ok() {
            if let Some(title) = document.select(&title_selector).next() {
                outcome
                    .data
                    .insert("title".to_string(), Value::String(title.text().collect::<String>().trim().to_string()));
            }
        }
        if let Some(description) = outcome.data.get("Meta_description").cloned() {
            outcome.data.insert("description".to_string(), description);
        }
        if let Some(keywords) = outcome.data.get("Meta_keywords").cloned() {
            outcome.data.insert("keywords".to_string(), keywords);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_and_property_meta_tags() {
        let html = Html::parse_document(
            r#"<html><head>
                <meta name="description" content="a page">
                <meta property="og:title" content="OG Title">
            </head></html>"#,
        );
        let outcome = MetadataExtractor.extract(&html, "https://example.com/");
        assert_eq!(outcome.data.get("Meta_description").and_then(Value::as_str), Some("a page"));
        assert_eq!(outcome.data.get("Meta_og:title").and_then(Value::as_str), Some("OG Title"));
        assert_eq!(outcome.data.get("description").and_then(Value::as_str), Some("a page"));
    }

    #[test]
    fn missing_title_produces_no_title_entry() {
        let html = Html::parse_document("<html><body>no title here</body></html>");
        let outcome = MetadataExtractor.extract(&html, "https://example.com/");
        assert!(!outcome.data.contains_key("title"));
    }
}
