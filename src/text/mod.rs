//! Text cleanup and word counting for extracted PDF text.
//!
//! Every strategy's raw output goes through [`normalize_extracted_text`] and then
//! [`count_words`], so counts from different extractors are comparable.

pub mod normalize;
pub mod word_count;

pub use normalize::normalize_extracted_text;
pub use word_count::{count_words, word_count_of};
