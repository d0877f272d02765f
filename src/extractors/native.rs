//! Native structured-text strategy backed by `pdf_oxide`.

use std::path::Path;

use pdf_oxide::PdfDocument;

use super::{join_pages, StrategyError, StrategyResult, TextStrategy};

/// Structured text extraction, page by page, in content order.
///
/// Fast and faithful for born-digital documents; the first strategy tried.
pub struct NativeStrategy;

impl TextStrategy for NativeStrategy {
    fn text_for(&self, path: &Path) -> StrategyResult {
        let mut doc = PdfDocument::open(path)
            .map_err(|e| StrategyError::Extraction(format!("open: {}", e)))?;
        let page_count = doc
            .page_count()
            .map_err(|e| StrategyError::Extraction(format!("page tree: {}", e)))?;

        let pages: Vec<_> = (0..page_count).map(|i| doc.extract_text(i)).collect();
        join_pages(self.name(), path, pages)
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
