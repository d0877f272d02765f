//! Word-boundary tokenizer.
//!
//! A word is a maximal run of Unicode letters, digits, underscores, apostrophes
//! and hyphens bounded by word boundaries, so `"state-of-the-art"` is one word and
//! a bare `"---"` page separator is none.

use lazy_static::lazy_static;
use regex::Regex;

use super::normalize::normalize_extracted_text;

lazy_static! {
    static ref RE_WORD: Regex = Regex::new(r"\b[\w'-]+\b").unwrap();
}

/// Count words in already-normalized text.
///
/// # Examples
///
/// ```
/// use pdf_wordcount::text::count_words;
///
/// assert_eq!(count_words("O'Neil's state-of-the-art plan, 2024."), 4);
/// assert_eq!(count_words(""), 0);
/// ```
pub fn count_words(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    RE_WORD.find_iter(text).count()
}

/// Normalize raw extractor output, then count its words.
pub fn word_count_of(raw: &str) -> usize {
    count_words(&normalize_extracted_text(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_are_not_words() {
        assert_eq!(count_words("page one\n\n---\n\npage two"), 4);
        assert_eq!(count_words("- -- ' ''"), 0);
    }

    #[test]
    fn test_unicode_words() {
        assert_eq!(count_words("ação pública município"), 3);
        assert_eq!(count_words("Größe café"), 2);
    }

    #[test]
    fn test_trailing_apostrophe_not_counted_separately() {
        assert_eq!(count_words("'quoted' words"), 2);
    }

    #[test]
    fn test_numbers_count() {
        assert_eq!(count_words("R$ 1.000,00 em 2024"), 6);
    }

    #[test]
    fn test_word_count_of_rejoins_wraps() {
        // Without rejoining, "Govern-" and "ment" would be two words
        assert_eq!(word_count_of("Govern-\nment plan"), 2);
        assert_eq!(word_count_of("\r\n  \n"), 0);
    }
}
