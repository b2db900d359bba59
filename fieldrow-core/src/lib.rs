// Fieldrow Core Library
//
// Rule-driven field extraction from sectioned assessment text.
// Main interface for turning one document's plain text into one
// schema-ordered spreadsheet row.

pub mod types;
pub mod schema;
pub mod config;
pub mod sectionizer;
pub mod rules;
pub mod extractor;
pub mod source;
pub mod sink;
pub mod storage;

// Re-export main types and functions for easy use
pub use types::*;
pub use schema::{LabelSchema, SchemaSpec};
pub use config::ExtractionConfig;
pub use extractor::FieldExtractor;
pub use source::{PlainTextSource, TextSource};
