//! Progress reconciliation.
//!
//! Outstanding work is never stored; it is recomputed on every run as
//! `manifest - completed`, where `completed` is read back from the results
//! store. Any interruption point is therefore safe to resume from.

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::manifest::{Manifest, ManifestEntry};
use crate::records::{FileId, ResultRecord};
use crate::writer::ends_with_newline;

/// How the completion set was recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reconciliation {
    /// No results store yet (or an empty one)
    NoResults,
    /// Read from the `file_id` column
    ById,
    /// Older store without usable ids; joined on `file_name` against the manifest
    ByPath,
}

/// Ids already present in the results store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSet {
    ids: HashSet<FileId>,
    mode: Reconciliation,
}

impl CompletionSet {
    /// Whether an id is done.
    pub fn contains(&self, file_id: FileId) -> bool {
        self.ids.contains(&file_id)
    }

    /// Number of distinct completed ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when nothing is done yet.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// How the set was recovered.
    pub fn mode(&self) -> Reconciliation {
        self.mode
    }

    /// The raw id set.
    pub fn ids(&self) -> &HashSet<FileId> {
        &self.ids
    }
}

/// Read the set of completed ids from the results store.
///
/// Rows torn by an interrupted write are skipped: a final row not terminated
/// by a newline, and any row whose field count differs from the header. If the store has no `file_id` column, or the
/// column holds something that is not an id, completion is recovered by
/// matching `file_name` against the manifest instead. Rows appended in the
/// current `file_id,file_name,word_count` layout beneath such an older header
/// still count by their id.
pub fn completed_ids(results_path: &Path, manifest: &Manifest) -> Result<CompletionSet> {
    if !results_path.exists() {
        return Ok(CompletionSet {
            ids: HashSet::new(),
            mode: Reconciliation::NoResults,
        });
    }

    let Some(table) = read_rows(results_path)? else {
        return Ok(CompletionSet {
            ids: HashSet::new(),
            mode: Reconciliation::NoResults,
        });
    };

    let id_col = table.headers.iter().position(|h| h == "file_id");
    let name_col = table.headers.iter().position(|h| h == "file_name");
    // Rows this crate appended under an older header carry their own id
    let appended: HashSet<FileId> = table
        .current_layout
        .iter()
        .filter_map(|row| row[0].trim().parse().ok())
        .collect();

    if let Some(col) = id_col {
        match parse_id_column(&table.rows, col) {
            Ok(mut ids) => {
                ids.extend(appended);
                return Ok(CompletionSet {
                    ids,
                    mode: Reconciliation::ById,
                });
            },
            Err(bad) => log::warn!(
                "Results store {} has unreadable file_id {:?}; reconciling by file_name",
                results_path.display(),
                bad
            ),
        }
    }

    let Some(col) = name_col else {
        return Err(Error::SchemaMismatch {
            path: results_path.to_path_buf(),
            reason: "neither a usable file_id nor a file_name column".to_string(),
        });
    };

    let mut ids: HashSet<FileId> = table
        .rows
        .iter()
        .filter_map(|row| row.get(col))
        .filter_map(|name| manifest.id_for_path(name))
        .collect();
    ids.extend(appended);
    Ok(CompletionSet {
        ids,
        mode: Reconciliation::ByPath,
    })
}

/// Manifest entries not yet completed, in manifest order.
pub fn todo<'a>(manifest: &'a Manifest, completed: &CompletionSet) -> Vec<&'a ManifestEntry> {
    manifest
        .iter()
        .filter(|entry| !completed.contains(entry.file_id))
        .collect()
}

/// The last `n` well-formed rows of the results store, oldest first.
pub fn tail_results(results_path: &Path, n: usize) -> Result<Vec<ResultRecord>> {
    if !results_path.exists() || n == 0 {
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(results_path)?;
    let mut rows: Vec<_> = reader.deserialize::<ResultRecord>().collect();
    if !ends_with_newline(results_path)? {
        rows.pop();
    }
    let mut tail = VecDeque::with_capacity(n);
    for row in rows {
        let Ok(record) = row else { continue };
        if tail.len() == n {
            tail.pop_front();
        }
        tail.push_back(record);
    }
    Ok(tail.into_iter().collect())
}

/// Column layout of rows written by [`crate::writer::CheckpointWriter`].
const RESULT_COLUMNS: [&str; 3] = ["file_id", "file_name", "word_count"];

/// Well-formed rows of a results store.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Rows in [`RESULT_COLUMNS`] layout found under a different header
    current_layout: Vec<Vec<String>>,
}

/// Header plus complete rows, or `None` for a zero-length store.
fn read_rows(path: &Path) -> Result<Option<Table>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Ok(None);
    }
    let legacy_header = headers.iter().map(String::as_str).ne(RESULT_COLUMNS);

    let mut table = Table {
        headers,
        rows: Vec::new(),
        current_layout: Vec::new(),
    };
    let mut records: Vec<_> = reader.byte_records().collect();
    let mut torn = 0usize;
    // A final row without its newline may have lost trailing characters
    if !ends_with_newline(path)? && records.pop().is_some() {
        torn += 1;
    }
    for record in records {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping unreadable row in {}: {}", path.display(), e);
                torn += 1;
                continue;
            },
        };
        let fields: Option<Vec<String>> = record
            .iter()
            .map(|f| std::str::from_utf8(f).ok().map(str::to_string))
            .collect();
        match fields {
            Some(fields) if fields.len() == table.headers.len() => table.rows.push(fields),
            Some(fields) if legacy_header && fields.len() == RESULT_COLUMNS.len() => {
                table.current_layout.push(fields)
            },
            _ => torn += 1,
        }
    }
    if torn > 0 {
        log::warn!("Ignored {} incomplete row(s) in {}", torn, path.display());
    }
    Ok(Some(table))
}

fn parse_id_column(rows: &[Vec<String>], col: usize) -> std::result::Result<HashSet<FileId>, String> {
    rows.iter()
        .map(|row| {
            let raw = row[col].trim();
            raw.parse::<FileId>().map_err(|_| raw.to_string())
        })
        .collect()
}
