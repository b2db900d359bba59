// Text source abstraction
//
// This module defines the boundary between document acquisition (file ->
// plain text) and extraction (text -> row). The engine treats document text
// as an opaque string and has no knowledge of the originating binary format;
// converting PDFs or DOCX files to text belongs behind this seam, outside
// the core.

use anyhow::{bail, Result};
use std::path::Path;

/// TextSource trait - produces the full plain text of a document
///
/// Page or paragraph boundaries arrive preserved as newlines. Everything
/// after this point works on one decoded string and is format-agnostic.
pub trait TextSource {
    /// Load the full plain text for a document handle.
    fn load_text(&self, input: &Path) -> Result<String>;

    /// Check if this source supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;

    /// Get source name for debugging/logging
    fn name(&self) -> &str;
}

/// Reads pre-converted plain-text documents. Binary formats are rejected
/// with a pointer to convert first.
pub struct PlainTextSource;

impl Default for PlainTextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainTextSource {
    pub fn new() -> Self {
        Self
    }
}

impl TextSource for PlainTextSource {
    fn load_text(&self, input: &Path) -> Result<String> {
        if !self.supports_file_type(input) {
            bail!(
                "Unsupported file type: {} (convert PDF/DOCX documents to plain text first)",
                input.display()
            );
        }
        Ok(std::fs::read_to_string(input)?)
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("txt") | Some("text")
        )
    }

    fn name(&self) -> &str {
        "PlainText"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_binary_document_formats() {
        let source = PlainTextSource::new();
        assert!(!source.supports_file_type(Path::new("note.pdf")));
        assert!(!source.supports_file_type(Path::new("note.docx")));
        assert!(source.supports_file_type(Path::new("note.txt")));

        let err = source.load_text(Path::new("note.pdf")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }
}
