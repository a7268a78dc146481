//! Brand assignment from a brand alias dictionary.
//!
//! Two passes over the record's text fields:
//! 1. Exact: every word of an alias appears as a whole word in a field
//! 2. Fuzzy: only when the exact pass found nothing, brand-specific fields are
//!    tokenized and each token is scored against the aliases with a
//!    length-dependent threshold

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;
use thiserror::Error;
use tradeflow_features::{similarity, truncate_chars};
use tradeflow_model::{fields, BrandAliasIndex, BrandAssignment, RecordError, TradeRecord};

static WORD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

#[derive(Debug, Error)]
pub enum BrandError {
    #[error("cannot compile alias word '{word}'")]
    AliasPattern {
        word: String,
        #[source]
        error: regex::Error,
    },
}

/// Configuration for brand matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandMatcherConfig {
    /// Fields searched by the exact pass, in priority order
    pub exact_fields: Vec<String>,
    /// Fields searched by the fuzzy pass
    pub fuzzy_fields: Vec<String>,
    /// Field text is cut to this many characters before matching
    pub max_field_chars: usize,
    /// Shorter aliases never take part in fuzzy matching
    pub min_alias_len: usize,
    /// Shorter tokens are not scored
    pub min_token_len: usize,
}

impl Default for BrandMatcherConfig {
    fn default() -> Self {
        Self {
            exact_fields: vec![
                fields::PROD_BRAND.to_string(),
                fields::PROD_MAN.to_string(),
                fields::EXPORTER_NAME.to_string(),
                fields::PROD_DETAILS.to_string(),
            ],
            fuzzy_fields: vec![fields::PROD_BRAND.to_string(), fields::PROD_MAN.to_string()],
            max_field_chars: 1000,
            min_alias_len: 3,
            min_token_len: 3,
        }
    }
}

/// Similarity (0-100) a token must reach to fuzzy-match an alias.
///
/// Short tokens are almost always false positives under edit distance, so
/// tokens of three characters or less only match exactly.
pub fn adaptive_threshold(token: &str) -> f64 {
    match token.chars().count() {
        0..=3 => 100.0,
        4..=5 => 97.0,
        6..=7 => 95.0,
        _ => 90.0,
    }
}

/// One word of an alias.
enum AliasWord {
    /// Plain word; present iff it equals one of the field's word runs
    Token(String),
    /// Contains punctuation; must be delimited by non-word characters
    Pattern(Regex),
}

struct CompiledAlias {
    brand: String,
    words: Vec<AliasWord>,
}

/// Brand matcher over one alias dictionary snapshot.
pub struct BrandMatcher {
    config: BrandMatcherConfig,
    aliases: Vec<CompiledAlias>,
    /// `(alias, brand)` eligible for fuzzy matching, in alias order
    fuzzy_keys: Vec<(String, String)>,
}

impl BrandMatcher {
    pub fn new(index: &BrandAliasIndex, config: BrandMatcherConfig) -> Result<Self, BrandError> {
        let mut aliases = Vec::with_capacity(index.len());
        let mut fuzzy_keys = Vec::new();

        for (alias, brand) in index.iter() {
            let words = alias
                .split_whitespace()
                .map(|word| {
                    if word.chars().all(is_word_char) {
                        Ok(AliasWord::Token(word.to_string()))
                    } else {
                        Regex::new(&format!(r"(?:^|\W){}(?:\W|$)", regex::escape(word)))
                            .map(AliasWord::Pattern)
                            .map_err(|error| BrandError::AliasPattern {
                                word: word.to_string(),
                                error,
                            })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            if words.is_empty() {
                continue;
            }
            aliases.push(CompiledAlias {
                brand: brand.to_string(),
                words,
            });
            if alias.chars().count() >= config.min_alias_len {
                fuzzy_keys.push((alias.to_string(), brand.to_string()));
            }
        }

        tracing::debug!(
            aliases = aliases.len(),
            fuzzy = fuzzy_keys.len(),
            "brand matcher built"
        );

        Ok(Self {
            config,
            aliases,
            fuzzy_keys,
        })
    }

    /// Assign a brand to a record using the configured fields.
    pub fn assign(&self, record: &TradeRecord) -> Result<BrandAssignment, RecordError> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.config.exact_fields.iter().chain(&self.config.fuzzy_fields) {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }
        let values = names
            .iter()
            .map(|name| Ok((*name, record.text(name)?)))
            .collect::<Result<Vec<_>, RecordError>>()?;
        let fields: Vec<(&str, Option<&str>)> =
            values.iter().map(|(name, value)| (*name, value.as_deref())).collect();
        Ok(self.assign_fields(&fields))
    }

    /// Assign a brand from named field values. Fields not named in the
    /// configuration are ignored.
    pub fn assign_fields(&self, fields: &[(&str, Option<&str>)]) -> BrandAssignment {
        let lookup = |name: &str| -> Option<String> {
            fields
                .iter()
                .find(|(n, _)| *n == name)
                .and_then(|(_, value)| *value)
                .map(|v| truncate_chars(&v.to_lowercase(), self.config.max_field_chars).to_string())
        };

        let mut found = BTreeSet::new();
        let mut evidence = Vec::new();

        for name in &self.config.exact_fields {
            let Some(text) = lookup(name) else { continue };
            let words: HashSet<&str> = WORD_RUN.find_iter(&text).map(|m| m.as_str()).collect();
            for alias in &self.aliases {
                if alias.words.iter().all(|w| w.is_present(&text, &words)) {
                    found.insert(alias.brand.clone());
                    push_unique(&mut evidence, name);
                }
            }
        }

        if !found.is_empty() {
            return BrandAssignment::from_candidates(found, evidence);
        }

        for name in &self.config.fuzzy_fields {
            let Some(text) = lookup(name) else { continue };
            for token in WORD_RUN.find_iter(&text).map(|m| m.as_str()) {
                if token.chars().count() < self.config.min_token_len {
                    continue;
                }
                if let Some((alias, brand, score)) = self.best_fuzzy(token) {
                    tracing::debug!(field = %name, token, alias, score, "fuzzy brand match");
                    found.insert(brand.to_string());
                    push_unique(&mut evidence, name);
                }
            }
        }

        BrandAssignment::from_candidates(found, evidence)
    }

    /// Best-scoring alias at or above the token's threshold; ties keep the
    /// alias that sorts first.
    fn best_fuzzy(&self, token: &str) -> Option<(&str, &str, f64)> {
        let threshold = adaptive_threshold(token);
        let mut best: Option<(&str, &str, f64)> = None;
        for (alias, brand) in &self.fuzzy_keys {
            let score = similarity(token, alias);
            if score < threshold {
                continue;
            }
            if best.map_or(true, |(_, _, s)| score > s) {
                best = Some((alias.as_str(), brand.as_str(), score));
            }
        }
        best
    }
}

impl AliasWord {
    fn is_present(&self, text: &str, words: &HashSet<&str>) -> bool {
        match self {
            Self::Token(word) => words.contains(word.as_str()),
            Self::Pattern(regex) => regex.is_match(text),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn push_unique(evidence: &mut Vec<String>, field: &str) {
    if !evidence.iter().any(|f| f == field) {
        evidence.push(field.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tradeflow_model::BrandLabel;

    fn matcher() -> BrandMatcher {
        let index = BrandAliasIndex::from_rows(vec![
            (Some("Bonomi"), Some("bonomi armatur, bonomi")),
            (Some("Zetkama"), Some("zetkama, зеткама")),
            (Some("Armaturprom"), Some("armaturprom")),
            (Some("ABC"), Some("abc")),
            (Some("Ballomax"), Some("s.p.a. ballomax")),
        ]);
        BrandMatcher::new(&index, BrandMatcherConfig::default()).unwrap()
    }

    #[test]
    fn test_adaptive_threshold_steps() {
        assert_eq!(adaptive_threshold("abc"), 100.0);
        assert_eq!(adaptive_threshold("abcd"), 97.0);
        assert_eq!(adaptive_threshold("abcdef"), 95.0);
        assert_eq!(adaptive_threshold("abcdefgh"), 90.0);
        assert_eq!(adaptive_threshold("задвижка"), 90.0);
    }

    #[test]
    fn test_exact_single_brand() {
        let result = matcher().assign_fields(&[("prod_man", Some("ZETKAMA Sp. z o.o."))]);
        assert_eq!(result.brand, BrandLabel::Brand("zetkama".into()));
        assert_eq!(result.evidence_fields, vec!["prod_man"]);
    }

    #[test]
    fn test_cyrillic_alias() {
        let result = matcher().assign_fields(&[("prod_details", Some("Кран ЗЕТКАМА Ду50"))]);
        assert_eq!(result.brand, BrandLabel::Brand("zetkama".into()));
    }

    #[test]
    fn test_mixed_brands() {
        let result = matcher().assign_fields(&[(
            "prod_details",
            Some("краны zetkama и затворы bonomi armatur"),
        )]);
        assert!(result.is_mixed());
        assert_eq!(
            result.candidates.into_iter().collect::<Vec<_>>(),
            vec!["bonomi", "zetkama"]
        );
        assert_eq!(result.evidence_fields, vec!["prod_details"]);
    }

    #[test]
    fn test_alias_with_punctuation() {
        let result = matcher().assign_fields(&[("prod_brand", Some("Ballomax S.p.A. valves"))]);
        assert_eq!(result.brand, BrandLabel::Brand("ballomax".into()));
    }

    #[test]
    fn test_exact_pass_precludes_fuzzy() {
        let m = matcher();
        // "armaturprom1" is one edit from "armaturprom" and would match fuzzily
        let fuzzy_only = m.assign_fields(&[("prod_brand", Some("armaturprom1"))]);
        assert_eq!(fuzzy_only.brand, BrandLabel::Brand("armaturprom".into()));

        let result = m.assign_fields(&[
            ("prod_brand", Some("armaturprom1")),
            ("prod_man", Some("Bonomi Armatur")),
        ]);
        assert_eq!(result.brand, BrandLabel::Brand("bonomi".into()));
        assert_eq!(result.evidence_fields, vec!["prod_man"]);
    }

    #[test]
    fn test_short_tokens_need_exact_match() {
        let result = matcher().assign_fields(&[("prod_brand", Some("abd"))]);
        assert_eq!(result, BrandAssignment::undetermined());
    }

    #[test]
    fn test_fuzzy_on_long_token() {
        let index = BrandAliasIndex::from_rows(vec![(Some("Bonomi"), Some("bonomiarmatur"))]);
        let m = BrandMatcher::new(&index, BrandMatcherConfig::default()).unwrap();
        let result = m.assign_fields(&[("prod_man", Some("BONOMIARMATYR"))]);
        assert_eq!(result.brand, BrandLabel::Brand("bonomi".into()));
        assert_eq!(result.evidence_fields, vec!["prod_man"]);
    }

    #[test]
    fn test_fuzzy_skips_description() {
        let result = matcher().assign_fields(&[("prod_details", Some("armaturprom1"))]);
        assert!(!result.is_determined());
    }

    #[test]
    fn test_record_with_nested_value_fails() {
        let record = TradeRecord::new().with_field("prod_brand", serde_json::json!(["a", "b"]));
        assert!(matcher().assign(&record).is_err());
    }

    #[test]
    fn test_assign_reads_record_fields() {
        let record = TradeRecord::new()
            .with_field("prod_brand", "Zetkama")
            .with_field("prod_details", serde_json::Value::Null);
        let result = matcher().assign(&record).unwrap();
        assert_eq!(result.brand, BrandLabel::Brand("zetkama".into()));
    }
}
