//! Content-type dispatching extractor pipeline (spec §4.4).
//!
//! `Parser::parse` routes a `DownloadResult` to HTML, plain-text, JSON or
//! binary handling based on its content-type prefix. HTML bodies are parsed
//! into a `scraper::Html` document and run through every registered
//! `ContentExtractor` inside a single blocking task; their links and data
//! are merged into a single `ParseResult`.

mod content;
mod error;
mod extractor;
mod link;
mod metadata;
mod parser;

pub use content::BodyContentExtractor;
pub use error::ParseError;
pub use extractor::{ContentExtractor, ExtractOutcome, ExtractorRegistry};
pub use link::LinkExtractor;
pub use metadata::MetadataExtractor;
pub use parser::Parser;
