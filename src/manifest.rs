//! Stable document identifiers.
//!
//! The manifest maps every document of a corpus to a `file_id` exactly once, at
//! the start of the corpus's life. It is persisted as a CSV table
//! (`file_id,file_name`) inside the corpus root and thereafter loaded verbatim:
//! no re-scan, no re-sort. Regenerating it would silently reassign ids and
//! break the join with results already recorded, so that is left to an operator
//! deleting the file by hand.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::corpus::{relative_name, scan_documents};
use crate::error::{Error, Result};
use crate::records::FileId;

/// One document of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Stable identifier
    pub file_id: FileId,
    /// Path relative to the corpus root, `/`-separated
    #[serde(rename = "file_name")]
    pub file_path: String,
}

/// Where a manifest came from on this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestOrigin {
    /// Read from an existing manifest file
    Loaded,
    /// Freshly scanned and persisted
    Built,
}

/// Immutable, ordered id assignment for a corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    by_path: HashMap<String, FileId>,
    origin: ManifestOrigin,
}

impl Manifest {
    /// Load the manifest at `manifest_path` if it exists, otherwise scan `root`,
    /// assign sequential ids in scan order, persist, and return the new manifest.
    pub fn load_or_build(root: &Path, manifest_path: &Path) -> Result<Self> {
        if manifest_path.exists() {
            let manifest = Self::load(manifest_path)?;
            log::info!(
                "Loaded manifest {} ({} documents)",
                manifest_path.display(),
                manifest.len()
            );
            Ok(manifest)
        } else {
            let manifest = Self::build(root, manifest_path)?;
            log::info!(
                "Built manifest {} ({} documents)",
                manifest_path.display(),
                manifest.len()
            );
            Ok(manifest)
        }
    }

    /// Read a persisted manifest exactly as stored.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut entries = Vec::new();
        for row in reader.deserialize() {
            let entry: ManifestEntry = row.map_err(|e| Error::ManifestCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            entries.push(entry);
        }
        Self::from_entries(entries, ManifestOrigin::Loaded).map_err(|reason| {
            Error::ManifestCorrupt {
                path: path.to_path_buf(),
                reason,
            }
        })
    }

    /// Scan `root`, assign ids `0..n` in scan order, and persist atomically.
    pub fn build(root: &Path, manifest_path: &Path) -> Result<Self> {
        let documents = scan_documents(root)?;

        let mut entries = Vec::with_capacity(documents.len());
        for relative in &documents {
            match relative_name(relative) {
                Some(name) => entries.push(ManifestEntry {
                    file_id: entries.len() as FileId,
                    file_path: name,
                }),
                None => log::warn!("Skipping non UTF-8 path {}", relative.display()),
            }
        }
        if entries.is_empty() {
            return Err(Error::NoDocuments(root.to_path_buf()));
        }

        let manifest = Self::from_entries(entries, ManifestOrigin::Built).map_err(|reason| {
            Error::ManifestCorrupt {
                path: manifest_path.to_path_buf(),
                reason,
            }
        })?;
        manifest.persist(manifest_path)?;
        Ok(manifest)
    }

    /// Build an in-memory manifest from entries, checking id and path uniqueness.
    fn from_entries(
        entries: Vec<ManifestEntry>,
        origin: ManifestOrigin,
    ) -> std::result::Result<Self, String> {
        if entries.is_empty() {
            return Err("manifest has no entries".to_string());
        }

        let mut ids = HashSet::with_capacity(entries.len());
        let mut by_path = HashMap::with_capacity(entries.len());
        for entry in &entries {
            if !ids.insert(entry.file_id) {
                return Err(format!("duplicate file_id {}", entry.file_id));
            }
            if by_path.insert(entry.file_path.clone(), entry.file_id).is_some() {
                return Err(format!("duplicate file_name {}", entry.file_path));
            }
        }

        let contiguous = entries.iter().enumerate().all(|(i, e)| e.file_id == i as FileId);
        if !contiguous {
            log::warn!("Manifest ids are not contiguous from 0; using them as stored");
        }

        Ok(Self {
            entries,
            by_path,
            origin,
        })
    }

    fn persist(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            for entry in &self.entries {
                writer.serialize(entry)?;
            }
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Entries in manifest order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Iterate entries in manifest order.
    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id assigned to a relative path.
    pub fn id_for_path(&self, file_path: &str) -> Option<FileId> {
        self.by_path.get(file_path).copied()
    }

    /// Whether this manifest was loaded or built on this run.
    pub fn origin(&self) -> ManifestOrigin {
        self.origin
    }

    /// Absolute path of an entry's document.
    pub fn document_path(root: &Path, entry: &ManifestEntry) -> PathBuf {
        root.join(&entry.file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"%PDF-1.4").unwrap();
    }

    #[test]
    fn test_build_assigns_ids_in_scan_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "c.pdf");
        touch(dir.path(), "a.pdf");
        touch(dir.path(), "sub/b.pdf");
        let manifest_path = dir.path().join("_pdf_manifest.csv");

        let manifest = Manifest::load_or_build(dir.path(), &manifest_path).unwrap();
        assert_eq!(manifest.origin(), ManifestOrigin::Built);
        assert!(!manifest.is_empty());
        let pairs: Vec<_> = manifest
            .iter()
            .map(|e| (e.file_id, e.file_path.as_str()))
            .collect();
        assert_eq!(pairs, vec![(0, "a.pdf"), (1, "c.pdf"), (2, "sub/b.pdf")]);

        let on_disk = fs::read_to_string(&manifest_path).unwrap();
        assert_eq!(on_disk, "file_id,file_name\n0,a.pdf\n1,c.pdf\n2,sub/b.pdf\n");
    }

    #[test]
    fn test_loaded_manifest_is_never_rescanned() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.pdf");
        touch(dir.path(), "d.pdf");
        let manifest_path = dir.path().join("_pdf_manifest.csv");
        let first = Manifest::load_or_build(dir.path(), &manifest_path).unwrap();

        // A document sorting before every existing one must not shift ids
        touch(dir.path(), "a.pdf");
        let second = Manifest::load_or_build(dir.path(), &manifest_path).unwrap();

        assert_eq!(second.origin(), ManifestOrigin::Loaded);
        assert_eq!(first.entries(), second.entries());
        assert_eq!(second.id_for_path("a.pdf"), None);
        assert_eq!(second.id_for_path("d.pdf"), Some(1));
    }

    #[test]
    fn test_load_is_verbatim_not_resorted() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("m.csv");
        fs::write(&manifest_path, "file_id,file_name\n0,z.pdf\n1,a.pdf\n").unwrap();

        let manifest = Manifest::load(&manifest_path).unwrap();
        assert_eq!(manifest.entries()[0].file_path, "z.pdf");
        assert_eq!(manifest.id_for_path("a.pdf"), Some(1));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("m.csv");
        fs::write(&manifest_path, "file_id,file_name\n0,a.pdf\n0,b.pdf\n").unwrap();

        let err = Manifest::load(&manifest_path).unwrap_err();
        assert!(matches!(err, Error::ManifestCorrupt { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("m.csv");
        fs::write(&manifest_path, "file_id,file_name\n0,a.pdf\n1,a.pdf\n").unwrap();
        assert!(Manifest::load(&manifest_path).is_err());
    }

    #[test]
    fn test_empty_corpus_builds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("_pdf_manifest.csv");

        let err = Manifest::load_or_build(dir.path(), &manifest_path).unwrap_err();
        assert!(matches!(err, Error::NoDocuments(_)));
        assert!(!manifest_path.exists());
    }
}
