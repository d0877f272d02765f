//! # PDF Word Count
//!
//! Resumable word counting for large, slowly growing PDF corpora.
//!
//! ## How it works
//!
//! - **Manifest**: every document gets a stable `file_id` once, when the corpus
//!   is first seen. The mapping is persisted next to the documents and never
//!   regenerated automatically.
//! - **Extraction cascade**: text is extracted with the cheapest strategy first
//!   and escalated (fallback parsers, then optional OCR) only while the word
//!   count stays below a quality threshold. The best count seen wins.
//! - **Append-only stores**: results and errors are buffered and appended to CSV
//!   tables in checkpoints. Outstanding work is recomputed on every run as
//!   manifest minus recorded results, so a run can be killed at any point and
//!   simply started again.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use pdf_wordcount::{run_corpus, Cascade, RunConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::new().with_ocr_threshold(20).with_batch_flush_size(200);
//! let cascade = Cascade::from_config(&config);
//! let summary = run_corpus(Path::new("/data/pledges"), &config, &cascade)?;
//! println!("{} processed, {} failed", summary.processed, summary.failed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Corpus discovery and stable ids
pub mod corpus;
pub mod manifest;

// Text extraction and counting
pub mod extractors;
pub mod pipeline;
pub mod text;

// Persistence and reconciliation
pub mod ledger;
pub mod records;
pub mod writer;

// Orchestration
pub mod run;

// Re-exports
pub use config::{CorpusLocation, RunConfig};
pub use error::{Error, Result};
pub use extractors::{StrategyError, TextStrategy};
pub use ledger::{completed_ids, todo, CompletionSet, Reconciliation};
pub use manifest::{Manifest, ManifestEntry, ManifestOrigin};
pub use pipeline::{Cascade, CascadeOutcome};
pub use records::{ErrorRecord, FileId, ResultRecord};
pub use run::{run_corpus, run_located, RunSummary};
pub use writer::{AppendStore, CheckpointWriter, FlushReport};
