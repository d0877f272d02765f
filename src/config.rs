//! Configuration for a word counting run.
//!
//! All values are fixed at startup and threaded through the orchestrator as an
//! immutable [`RunConfig`]; nothing here is read from ambient state mid-run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default manifest file name, created inside the corpus root.
pub const DEFAULT_MANIFEST_NAME: &str = "_pdf_manifest.csv";
/// Default results file name (append-only).
pub const DEFAULT_RESULTS_NAME: &str = "wordcounts.csv";
/// Default errors file name (append-only).
pub const DEFAULT_ERRORS_NAME: &str = "wordcounts_errors.csv";

/// Run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Enable the rasterize + OCR fallback strategy.
    pub use_ocr: bool,

    /// Tesseract language codes, e.g. `por+eng`.
    pub ocr_languages: String,

    /// Word count at or above which the cascade stops escalating.
    pub ocr_threshold: usize,

    /// Rasterization resolution for OCR.
    pub ocr_dpi: u32,

    /// Buffered result rows that trigger an intermediate flush.
    pub batch_flush_size: usize,

    /// Buffered error rows that trigger an intermediate flush.
    ///
    /// `None` derives `max(1, batch_flush_size / 5)`.
    pub error_flush_size: Option<usize>,

    /// Manifest file name inside the corpus root.
    pub manifest_name: String,

    /// Results file name inside the corpus root.
    pub results_name: String,

    /// Errors file name inside the corpus root.
    pub errors_name: String,

    /// Log a progress line every N processed documents.
    pub progress_every: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RunConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            use_ocr: false,
            ocr_languages: "por+eng".to_string(),
            ocr_threshold: 20,
            ocr_dpi: 300,
            batch_flush_size: 200,
            error_flush_size: None,
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            results_name: DEFAULT_RESULTS_NAME.to_string(),
            errors_name: DEFAULT_ERRORS_NAME.to_string(),
            progress_every: 100,
        }
    }

    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: RunConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Enable or disable OCR.
    pub fn with_ocr(mut self, enable: bool) -> Self {
        self.use_ocr = enable;
        self
    }

    /// Set OCR languages.
    pub fn with_ocr_languages(mut self, languages: impl Into<String>) -> Self {
        self.ocr_languages = languages.into();
        self
    }

    /// Set the escalation threshold.
    pub fn with_ocr_threshold(mut self, threshold: usize) -> Self {
        self.ocr_threshold = threshold;
        self
    }

    /// Set the result flush size.
    pub fn with_batch_flush_size(mut self, size: usize) -> Self {
        self.batch_flush_size = size;
        self
    }

    /// Set the error flush size explicitly.
    pub fn with_error_flush_size(mut self, size: usize) -> Self {
        self.error_flush_size = Some(size);
        self
    }

    /// Set the progress log interval.
    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    /// Effective error flush size.
    pub fn effective_error_flush_size(&self) -> usize {
        self.error_flush_size
            .unwrap_or_else(|| (self.batch_flush_size / 5).max(1))
    }

    /// Check ranges. Called once by the orchestrator before any work.
    pub fn validate(&self) -> Result<()> {
        if self.batch_flush_size == 0 {
            return Err(Error::InvalidConfig("batch_flush_size must be at least 1".into()));
        }
        if self.error_flush_size == Some(0) {
            return Err(Error::InvalidConfig("error_flush_size must be at least 1".into()));
        }
        if self.use_ocr && self.ocr_languages.trim().is_empty() {
            return Err(Error::InvalidConfig("use_ocr requires ocr_languages".into()));
        }
        for (key, name) in [
            ("manifest_name", &self.manifest_name),
            ("results_name", &self.results_name),
            ("errors_name", &self.errors_name),
        ] {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(Error::InvalidConfig(format!("{key} must be a plain file name")));
            }
        }
        if self.results_name == self.errors_name || self.results_name == self.manifest_name {
            return Err(Error::InvalidConfig(
                "manifest, results and errors must be distinct files".into(),
            ));
        }
        Ok(())
    }

    /// Manifest path for a corpus root.
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest_name)
    }

    /// Results path for a corpus root.
    pub fn results_path(&self, root: &Path) -> PathBuf {
        root.join(&self.results_name)
    }

    /// Errors path for a corpus root.
    pub fn errors_path(&self, root: &Path) -> PathBuf {
        root.join(&self.errors_name)
    }
}

/// How the corpus root is found at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusLocation {
    /// Use this directory as-is.
    Explicit(PathBuf),

    /// Search for a directory whose name contains `hint` under `search_roots`.
    Hint {
        /// Case-insensitive name fragment
        hint: String,
        /// Directories to search beneath
        search_roots: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert!(!config.use_ocr);
        assert_eq!(config.ocr_threshold, 20);
        assert_eq!(config.batch_flush_size, 200);
        assert_eq!(config.effective_error_flush_size(), 40);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_error_flush_size_never_zero() {
        let config = RunConfig::new().with_batch_flush_size(3);
        assert_eq!(config.effective_error_flush_size(), 1);
        let config = RunConfig::new().with_error_flush_size(7);
        assert_eq!(config.effective_error_flush_size(), 7);
    }

    #[test]
    fn test_validate_rejects_zero_flush() {
        let err = RunConfig::new().with_batch_flush_size(0).validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(RunConfig::new().with_error_flush_size(0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_ocr_without_languages() {
        let config = RunConfig::new().with_ocr(true).with_ocr_languages("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_colliding_names() {
        let mut config = RunConfig::new();
        config.errors_name = config.results_name.clone();
        assert!(config.validate().is_err());

        let mut config = RunConfig::new();
        config.results_name = "sub/results.csv".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"use_ocr": true, "batch_flush_size": 50}"#).unwrap();

        let config = RunConfig::from_json_file(&path).unwrap();
        assert!(config.use_ocr);
        assert_eq!(config.batch_flush_size, 50);
        assert_eq!(config.ocr_languages, "por+eng");
        assert_eq!(config.effective_error_flush_size(), 10);
    }

    #[test]
    fn test_paths_live_in_corpus_root() {
        let config = RunConfig::new();
        let root = Path::new("/corpus");
        assert_eq!(config.manifest_path(root), PathBuf::from("/corpus/_pdf_manifest.csv"));
        assert_eq!(config.results_path(root), PathBuf::from("/corpus/wordcounts.csv"));
        assert_eq!(config.errors_path(root), PathBuf::from("/corpus/wordcounts_errors.csv"));
    }
}
