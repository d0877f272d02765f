//! Pure object-level fallback parser backed by `lopdf`.

use std::path::Path;

use lopdf::Document;

use super::{join_pages, StrategyError, StrategyResult, TextStrategy};

/// Decodes each page's content stream directly.
///
/// Slower and layout-blind, but tolerant of documents whose structure trips
/// the native extractor.
pub struct LopdfStrategy;

impl TextStrategy for LopdfStrategy {
    fn text_for(&self, path: &Path) -> StrategyResult {
        let doc = Document::load(path)
            .map_err(|e| StrategyError::Extraction(format!("load: {}", e)))?;

        let pages: Vec<_> = doc
            .get_pages()
            .keys()
            .map(|&page_number| doc.extract_text(&[page_number]))
            .collect();
        join_pages(self.name(), path, pages)
    }

    fn name(&self) -> &'static str {
        "lopdf"
    }
}
