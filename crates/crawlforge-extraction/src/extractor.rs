use scraper::Html;
use serde_json::Value;
use std::collections::HashMap;

/// Output of a single `ContentExtractor::extract` call: discovered links
/// (may contain duplicates; the scheduler de-dups) plus arbitrary extracted
/// data keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ExtractOutcome {
    pub links: Vec<String>,
    pub data: HashMap<String, Value>,
}

impl ExtractOutcome {
    pub fn new() -> Self {
        Self::default()
    }
}

/// An extractor's contract (spec §4.4): takes an immutable view of the
/// parsed document plus the download it came from, returns links and data.
/// Implementations must not panic; a failure should be captured in `data`
/// under an `error` key rather than propagated, so one extractor's failure
/// never fails the overall parse.
pub trait ContentExtractor: Send + Sync {
    /// Name used as the registry key and as a label in logs.
    fn name(&self) -> &str;

    fn extract(&self, document: &Html, base_url: &str) -> ExtractOutcome;
}

/// Name-keyed set of extractors the Parser iterates, replacing the source's
/// dynamic plugin loading (spec §9) with static registration.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<std::sync::Arc<dyn ContentExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extractor: std::sync::Arc<dyn ContentExtractor>) -> &mut Self {
        self.extractors.push(extractor);
        self
    }

    pub fn extractors(&self) -> &[std::sync::Arc<dyn ContentExtractor>] {
        &self.extractors
    }
}
