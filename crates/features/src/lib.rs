//! Text features shared by the tradeflow matchers.
//!
//! Provides pure functions and small immutable helpers:
//! - Mixed-script (Cyrillic/Latin homoglyph) normalization
//! - Tokenization and lemmatization
//! - Ordered first-match pattern tables
//! - String similarity scoring

pub mod lemma;
pub mod patterns;
pub mod script;

pub use lemma::{word_tokens, DictionaryAnalyzer, Lemmatizer, MorphAnalyzer, SnowballAnalyzer};
pub use patterns::{OrderedPatterns, PatternError, PatternHit, PatternOrder};
pub use script::normalize_script;

/// Similarity of two strings on a 0-100 scale (normalized Levenshtein).
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("zetkama", "zetkama"), 100.0);
        assert!(similarity("zetkama", "zetkana") < 100.0);
        assert!(similarity("abc", "xyz") < 1.0);
    }

    #[test]
    fn test_truncate_chars_respects_utf8() {
        assert_eq!(truncate_chars("Кран шаровой", 4), "Кран");
        assert_eq!(truncate_chars("DN50", 10), "DN50");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  рога   и\tкопыта "), "рога и копыта");
    }
}
