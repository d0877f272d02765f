//! Rows of the manifest, results and errors tables.
//!
//! Column names are part of the on-disk format: `file_id`, `file_name`,
//! `word_count` and `error`.

use serde::{Deserialize, Serialize};

/// Stable identifier of a document within one corpus.
pub type FileId = u64;

/// One successfully counted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Manifest id
    pub file_id: FileId,
    /// Path relative to the corpus root
    #[serde(rename = "file_name")]
    pub file_path: String,
    /// Best word count the cascade found
    pub word_count: usize,
}

/// One document whose processing failed outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Manifest id
    pub file_id: FileId,
    /// Path relative to the corpus root
    #[serde(rename = "file_name")]
    pub file_path: String,
    /// Error message
    #[serde(rename = "error")]
    pub error_message: String,
}
