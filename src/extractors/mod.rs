//! Text extraction strategies.
//!
//! Each strategy turns one PDF into raw text. Strategies are interchangeable
//! behind [`TextStrategy`] and are ordered by the cascade from cheapest to most
//! expensive:
//!
//! - [`NativeStrategy`]: structured text extraction via `pdf_oxide`
//! - [`LopdfStrategy`]: pure object-level fallback parser via `lopdf`
//! - [`PdfExtractStrategy`]: alternative layout-driven parser via `pdf-extract`
//! - [`OcrStrategy`]: page rasterization with `pdftoppm` + `tesseract` (opt-in)
//!
//! A strategy reports failure through [`StrategyError`]; it never aborts a
//! document on its own. Panics from third-party parsers are contained by
//! [`run_contained`].

mod alt_parser;
mod fallback_parser;
mod native;
mod ocr;

pub use alt_parser::PdfExtractStrategy;
pub use fallback_parser::LopdfStrategy;
pub use native::NativeStrategy;
pub use ocr::OcrStrategy;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use crate::config::RunConfig;

/// Why a strategy produced no text.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// A required external tool or library is not installed
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The document could not be parsed, is encrypted, or yielded nothing readable
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The underlying parser panicked
    #[error("panicked: {0}")]
    Panicked(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StrategyError {
    /// Whether the strategy could not run at all, as opposed to running and
    /// failing to read the document.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, StrategyError::Unavailable(_) | StrategyError::Io(_))
    }
}

/// Result type for a single strategy.
pub type StrategyResult = std::result::Result<String, StrategyError>;

/// One way of turning a document into text.
///
/// Implementations are stateless with respect to documents: calling
/// `text_for` twice on the same file must not depend on earlier calls.
pub trait TextStrategy: Send + Sync {
    /// Extract raw, un-normalized text. May legitimately return an empty string.
    fn text_for(&self, path: &Path) -> StrategyResult;

    /// Short name used in logs and error rows.
    fn name(&self) -> &'static str;
}

/// Run a strategy, converting a panic inside it into [`StrategyError::Panicked`].
pub fn run_contained(strategy: &dyn TextStrategy, path: &Path) -> StrategyResult {
    match catch_unwind(AssertUnwindSafe(|| strategy.text_for(path))) {
        Ok(result) => result,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            log::warn!("{} panicked on {}: {}", strategy.name(), path.display(), reason);
            Err(StrategyError::Panicked(reason))
        },
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// The production strategy order for a configuration.
///
/// OCR is appended only when `use_ocr` is set.
pub fn default_strategies(config: &RunConfig) -> Vec<Box<dyn TextStrategy>> {
    let mut strategies: Vec<Box<dyn TextStrategy>> = vec![
        Box::new(NativeStrategy),
        Box::new(LopdfStrategy),
        Box::new(PdfExtractStrategy),
    ];
    if config.use_ocr {
        strategies.push(Box::new(OcrStrategy::new(
            config.ocr_languages.clone(),
            config.ocr_dpi,
        )));
    }
    strategies
}

/// Join per-page texts, skipping pages that failed.
///
/// Returns an error only when there were pages and every one of them failed.
pub(crate) fn join_pages<E: std::fmt::Display>(
    strategy: &str,
    path: &Path,
    pages: impl IntoIterator<Item = std::result::Result<String, E>>,
) -> StrategyResult {
    let mut texts = Vec::new();
    let mut failed = 0usize;
    let mut last_error = None;

    for (index, page) in pages.into_iter().enumerate() {
        match page {
            Ok(text) => texts.push(text),
            Err(e) => {
                log::debug!("{}: page {} of {} unreadable: {}", strategy, index, path.display(), e);
                failed += 1;
                last_error = Some(e.to_string());
            },
        }
    }

    if texts.is_empty() && failed > 0 {
        return Err(StrategyError::Extraction(format!(
            "all {} pages failed, last: {}",
            failed,
            last_error.unwrap_or_default()
        )));
    }

    Ok(texts.join("\n"))
}
