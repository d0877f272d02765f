//! Alternative layout-driven parser backed by `pdf-extract`.

use std::path::Path;

use super::{StrategyError, StrategyResult, TextStrategy};

/// Whole-document extraction through `pdf-extract`'s text output device.
///
/// Handles some font encodings the other parsers miss. Known to panic on a
/// few malformed font programs; the cascade runs it contained.
pub struct PdfExtractStrategy;

impl TextStrategy for PdfExtractStrategy {
    fn text_for(&self, path: &Path) -> StrategyResult {
        pdf_extract::extract_text(path).map_err(|e| StrategyError::Extraction(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "pdf-extract"
    }
}
