//! Normalization of raw extractor output.
//!
//! Extractors disagree on line endings, wrap points and spacing. Normalization
//! strips carriage returns, rejoins words broken by a line-wrap hyphen, and
//! collapses every whitespace run (newlines included) into a single space.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Hyphen immediately followed by a line break
    static ref RE_WRAP_HYPHEN: Regex = Regex::new(r"-\n").unwrap();

    /// Runs of newlines
    static ref RE_NEWLINES: Regex = Regex::new(r"\n+").unwrap();

    /// Runs of any whitespace
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize extracted text before counting.
///
/// # Examples
///
/// ```
/// use pdf_wordcount::text::normalize_extracted_text;
///
/// let raw = "Govern-\nment  of the\r\n\n  people ";
/// assert_eq!(normalize_extracted_text(raw), "Government of the people");
/// ```
pub fn normalize_extracted_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.replace('\r', "");
    let text = RE_WRAP_HYPHEN.replace_all(&text, "");
    let text = RE_NEWLINES.replace_all(&text, " ");
    let text = RE_WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}
