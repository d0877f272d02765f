//! Corpus root resolution.
//!
//! The corpus usually lives somewhere under a mounted drive whose exact layout
//! differs between machines, so the root is found by a name fragment instead of
//! a fixed path. When several directories match, the longest path wins: it is
//! the most specific match and does not depend on traversal order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::CorpusLocation;
use crate::error::{Error, Result};

/// Resolve a [`CorpusLocation`] to a directory.
pub fn resolve_corpus_root(location: &CorpusLocation) -> Result<PathBuf> {
    match location {
        CorpusLocation::Explicit(root) => {
            if !root.is_dir() {
                return Err(Error::InvalidConfig(format!(
                    "corpus root {} is not a directory",
                    root.display()
                )));
            }
            Ok(root.clone())
        },
        CorpusLocation::Hint { hint, search_roots } => locate_corpus_root(hint, search_roots),
    }
}

/// Find the directory whose name contains `hint` (case-insensitive) under any of
/// `search_roots`.
///
/// The search roots themselves are never candidates. Roots that do not exist are
/// skipped. Among candidates the longest path string is chosen; equal lengths are
/// broken by lexicographic order.
pub fn locate_corpus_root(hint: &str, search_roots: &[PathBuf]) -> Result<PathBuf> {
    let needle = hint.to_lowercase();
    let mut candidates: Vec<PathBuf> = Vec::new();

    for root in search_roots {
        if !root.exists() {
            log::debug!("Search root {} does not exist, skipping", root.display());
            continue;
        }
        for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                },
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if dir_name_matches(entry.path(), &needle) {
                candidates.push(entry.into_path());
            }
        }
    }

    let chosen = candidates.into_iter().max_by(|a, b| {
        let (la, lb) = (a.as_os_str().len(), b.as_os_str().len());
        // Longer wins; on ties the lexicographically smaller path wins
        la.cmp(&lb).then_with(|| b.cmp(a))
    });

    match chosen {
        Some(root) => {
            log::info!("Using root folder: {}", root.display());
            Ok(root)
        },
        None => Err(Error::CorpusRootNotFound {
            hint: hint.to_string(),
            searched: search_roots.to_vec(),
        }),
    }
}

fn dir_name_matches(path: &Path, needle: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase().contains(needle))
        .unwrap_or(false)
}
