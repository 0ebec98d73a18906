//! # GraphVC Extract
//!
//! Turns user input into a VC knowledge graph.
//!
//! URLs pass an SSRF guard and are scraped to plain text; the text is sent
//! to an OpenAI model with a strict JSON schema derived from the graph types.

pub mod error;
pub mod llm;
pub mod prompts;
pub mod schema;
pub mod scrape;
pub mod ssrf;

pub use error::{ExtractError, ExtractResult};
pub use llm::{Extraction, GraphExtractor, OpenAiConfig, OpenAiExtractor};
pub use scrape::{extract_text, Scraper, ScraperConfig};
pub use ssrf::{UrlValidator, ValidatedUrl};
