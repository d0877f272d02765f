//! Corpus discovery: finding the corpus root and enumerating its documents.

pub mod locate;
pub mod scanner;

pub use locate::{locate_corpus_root, resolve_corpus_root};
pub use scanner::{relative_name, scan_documents};
