use crate::extractor::{ContentExtractor, ExtractOutcome};
use scraper::{Html, Selector};
use serde_json::{json, Value};

const SUMMARY_LEN: usize = 200;
const STRIPPED_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Strips script/style/noscript nodes, extracts body text, and records
/// length, a summary, paragraph count and h1-h6 headings (spec §4.4). Named
/// `BodyContentExtractor` to avoid colliding with the `ContentExtractor`
/// trait it implements.
pub struct BodyContentExtractor;

impl ContentExtractor for BodyContentExtractor {
    fn name(&self) -> &str {
        "content"
    }

    fn extract(&self, document: &Html, _base_url: &str) -> ExtractOutcome {
        let mut outcome = ExtractOutcome::new();

        let text = extract_visible_text(document);
        let summary: String = text.chars().take(SUMMARY_LEN).collect();
        let paragraph_count = count_selector(document, "p");
        let headings: Vec<Value> = (1..=6)
            .map(|level| {
                let selector = format!("h{level}");
                let texts: Vec<String> = Selector::parse(&selector)
                    .map(|sel| {
                        document
                            .select(&sel)
                            .map(|el| el.text().collect::<String>().trim().to_string())
                            .filter(|t| !t.is_empty())
                            .collect()
                    })
                    .unwrap_or_default();
                json!(texts)
            })
            .collect();

        outcome.data.insert("text_length".to_string(), json!(text.len()));
        outcome.data.insert("summary".to_string(), json!(summary));
        outcome.data.insert("paragraph_count".to_string(), json!(paragraph_count));
        outcome.data.insert("headings".to_string(), json!(headings));

        outcome
    }
}

fn count_selector(document: &Html, selector: &str) -> usize {
    Selector::parse(selector)
        .map(|sel| document.select(&sel).count())
        .unwrap_or(0)
}

/// Whitespace-normalized text of every node that is not inside a stripped
/// tag (script/style/noscript) or an HTML comment.
pub(crate) fn extract_visible_text(document: &Html) -> String {
    let root = document.root_element();
    let mut buffer = String::new();
    collect_text(root, &mut buffer);
    buffer.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: scraper::ElementRef, buffer: &mut String) {
    let tag = element.value().name();
    if STRIPPED_TAGS.contains(&tag) {
        return;
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            buffer.push_str(text);
            buffer.push(' ');
        } else if let Some(child_element) = scraper::ElementRef::wrap(child) {
            collect_text(child_element, buffer);
        }
    }
}
