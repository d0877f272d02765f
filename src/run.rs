//! Run orchestration.
//!
//! load-or-build manifest → completed set → todo → for each document: cascade,
//! buffer a result or an error → final flush → summary.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::{CorpusLocation, RunConfig};
use crate::corpus::resolve_corpus_root;
use crate::error::Result;
use crate::ledger::{completed_ids, todo, Reconciliation};
use crate::manifest::{Manifest, ManifestOrigin};
use crate::pipeline::Cascade;
use crate::records::{ErrorRecord, ResultRecord};
use crate::writer::CheckpointWriter;

/// What a run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Corpus root used
    pub corpus_root: PathBuf,
    /// Whether the manifest was loaded or built on this run
    pub manifest_origin: ManifestOrigin,
    /// How completed documents were recognized
    pub reconciliation: Reconciliation,
    /// Documents in the manifest
    pub manifest_total: usize,
    /// Documents already in the results store when the run started
    pub already_done: usize,
    /// Documents attempted on this run
    pub processed: usize,
    /// Documents that produced a result row
    pub succeeded: usize,
    /// Documents that produced an error row
    pub failed: usize,
    /// Documents still without a result (eligible for the next run)
    pub remaining: usize,
    /// Results store
    pub results_path: PathBuf,
    /// Errors store, if one exists
    pub errors_path: Option<PathBuf>,
    /// Run start
    pub started_at: DateTime<Local>,
    /// Run end
    pub finished_at: DateTime<Local>,
}

/// Resolve the corpus root and run the production cascade over it.
pub fn run_located(location: &CorpusLocation, config: &RunConfig) -> Result<RunSummary> {
    config.validate()?;
    let root = resolve_corpus_root(location)?;
    let cascade = Cascade::from_config(config);
    log::info!(
        "Strategies: {} (threshold {} words)",
        cascade.strategy_names().join(" → "),
        cascade.threshold()
    );
    run_corpus(&root, config, &cascade)
}

/// Count words for every outstanding document of the corpus at `root`.
///
/// A failing document becomes an error row and the run moves on. Only
/// configuration errors and failures to write the stores abort the run.
pub fn run_corpus(root: &Path, config: &RunConfig, cascade: &Cascade) -> Result<RunSummary> {
    config.validate()?;
    let started_at = Local::now();
    let start = Instant::now();

    let manifest = Manifest::load_or_build(root, &config.manifest_path(root))?;
    let results_path = config.results_path(root);
    let completed = completed_ids(&results_path, &manifest)?;
    let pending = todo(&manifest, &completed);
    let already_done = manifest.len() - pending.len();

    log::info!(
        "Total PDFs in manifest: {} | Already done: {} | Remaining: {}",
        manifest.len(),
        already_done,
        pending.len()
    );

    let mut writer = CheckpointWriter::from_config(root, config);
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for (index, entry) in pending.iter().enumerate() {
        let path = Manifest::document_path(root, entry);
        match cascade.extract_word_count(&path) {
            Ok(word_count) => {
                log::debug!("[{}] {} → {} words", entry.file_id, entry.file_path, word_count);
                succeeded += 1;
                writer.push_result(ResultRecord {
                    file_id: entry.file_id,
                    file_path: entry.file_path.clone(),
                    word_count,
                })?;
            },
            Err(e) => {
                log::warn!("[{}] {} failed: {}", entry.file_id, entry.file_path, e);
                failed += 1;
                writer.push_error(ErrorRecord {
                    file_id: entry.file_id,
                    file_path: entry.file_path.clone(),
                    error_message: e.to_string(),
                })?;
            },
        }

        let done = index + 1;
        if config.progress_every > 0 && done % config.progress_every == 0 {
            log::info!(
                "Processing PDFs: {}/{} ({:.1}s elapsed)",
                done,
                pending.len(),
                start.elapsed().as_secs_f64()
            );
        }
    }

    writer.finish()?;

    let errors_path = config.errors_path(root);
    let summary = RunSummary {
        corpus_root: root.to_path_buf(),
        manifest_origin: manifest.origin(),
        reconciliation: completed.mode(),
        manifest_total: manifest.len(),
        already_done,
        processed: pending.len(),
        succeeded,
        failed,
        remaining: pending.len() - succeeded,
        results_path,
        errors_path: errors_path.exists().then_some(errors_path),
        started_at,
        finished_at: Local::now(),
    };

    log::info!(
        "Done in {:.1}s: {} succeeded, {} failed, {} remaining",
        start.elapsed().as_secs_f64(),
        summary.succeeded,
        summary.failed,
        summary.remaining
    );
    Ok(summary)
}
