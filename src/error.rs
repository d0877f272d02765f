//! Error types for corpus word counting.
//!
//! Configuration problems abort a run before any document is touched. Everything
//! that goes wrong while processing a single document is either absorbed by the
//! extraction cascade or surfaced as [`Error::AllStrategiesFailed`] / [`Error::Io`],
//! which the run orchestrator turns into an error row and moves on.

use std::path::PathBuf;

/// Result type alias for word counting operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while counting words over a corpus.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No directory matching the root hint exists under any search root
    #[error("No folder containing \"{hint}\" found under {}", display_roots(.searched))]
    CorpusRootNotFound {
        /// Case-insensitive fragment the directory name must contain
        hint: String,
        /// Search roots that were traversed
        searched: Vec<PathBuf>,
    },

    /// The corpus root holds no documents of the target type
    #[error("No PDFs detected under {0}")]
    NoDocuments(PathBuf),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Persisted manifest cannot be trusted as a stable id mapping
    #[error("Corrupt manifest {path}: {reason}")]
    ManifestCorrupt {
        /// Manifest file
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// Results store has neither an id nor a path column
    #[error("Unrecognized results schema in {path}: {reason}")]
    SchemaMismatch {
        /// Results file
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// Every extraction strategy failed to even run on a document
    #[error("All extraction strategies failed for {path}: {failures}")]
    AllStrategiesFailed {
        /// Document path
        path: PathBuf,
        /// `strategy: reason` pairs, semicolon separated
        failures: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (configuration or summary) error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal error
    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Whether this error is a configuration error that must abort the run
    /// before any processing starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::CorpusRootNotFound { .. }
                | Error::NoDocuments(_)
                | Error::InvalidConfig(_)
                | Error::ManifestCorrupt { .. }
        )
    }
}

fn display_roots(roots: &[PathBuf]) -> String {
    if roots.is_empty() {
        return "(no search roots)".to_string();
    }
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
