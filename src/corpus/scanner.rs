//! Recursive document enumeration under a corpus root.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Target document extension, matched case-insensitively.
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// Enumerate documents under `root`, returned as paths relative to `root` in
/// deterministic order.
///
/// The order is [`Path`] ordering of the relative paths (component by
/// component), so re-scanning an unchanged corpus reproduces it regardless of
/// the order the filesystem lists directories in.
///
/// # Errors
///
/// [`Error::NoDocuments`] when nothing matches; an empty manifest is never built.
pub fn scan_documents(root: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                if e.depth() == 0 {
                    return Err(e.into());
                }
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            },
        };
        if !entry.file_type().is_file() || !is_document(entry.path()) {
            continue;
        }
        match entry.path().strip_prefix(root) {
            Ok(relative) => documents.push(relative.to_path_buf()),
            Err(_) => log::warn!("{} is outside {}", entry.path().display(), root.display()),
        }
    }

    if documents.is_empty() {
        return Err(Error::NoDocuments(root.to_path_buf()));
    }

    documents.sort();
    log::debug!("Scanned {} documents under {}", documents.len(), root.display());
    Ok(documents)
}

/// Render a relative path as a manifest name: UTF-8 with `/` separators.
///
/// Returns `None` for paths that are not valid UTF-8.
pub fn relative_name(relative: &Path) -> Option<String> {
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
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
    fn test_recursive_sorted_relative() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "z.pdf");
        touch(dir.path(), "b/2.pdf");
        touch(dir.path(), "a/c/1.PDF");
        touch(dir.path(), "a/notes.txt");

        let docs = scan_documents(dir.path()).unwrap();
        let names: Vec<_> = docs.iter().map(|p| relative_name(p).unwrap()).collect();
        assert_eq!(names, vec!["a/c/1.PDF", "b/2.pdf", "z.pdf"]);
    }

    #[test]
    fn test_component_order_not_string_order() {
        let dir = tempfile::tempdir().unwrap();
        // As strings "a-b/x.pdf" < "a/x.pdf" ('-' < '/'); by components "a" < "a-b"
        touch(dir.path(), "a-b/x.pdf");
        touch(dir.path(), "a/x.pdf");

        let docs = scan_documents(dir.path()).unwrap();
        assert_eq!(docs, vec![PathBuf::from("a/x.pdf"), PathBuf::from("a-b/x.pdf")]);
    }

    #[test]
    fn test_empty_corpus_is_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.txt");
        let err = scan_documents(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoDocuments(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_root_is_error() {
        assert!(scan_documents(Path::new("/nonexistent/corpus")).is_err());
    }
}
