//! First-match-in-priority-order pattern tables.
//!
//! Both the legal-form cascade and the attribute dictionaries are ordered
//! lists of `(pattern, label)` where the first matching entry wins. This module
//! owns that scan so the tables themselves stay plain data.

use regex::{Regex, RegexBuilder};
use std::cmp::Reverse;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern '{pattern}'")]
    Invalid {
        pattern: String,
        #[source]
        error: regex::Error,
    },
}

/// Evaluation order of a pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternOrder {
    /// Entries are tried in the order they were given
    #[default]
    Declared,
    /// Longest pattern source first; ties keep declaration order
    LongestSource,
}

#[derive(Debug, Clone)]
struct PatternEntry<L> {
    pattern: String,
    regex: Regex,
    label: L,
}

/// A compiled, ordered pattern table.
#[derive(Debug, Clone)]
pub struct OrderedPatterns<L> {
    entries: Vec<PatternEntry<L>>,
}

/// The entry that won a scan, plus where it matched.
#[derive(Debug, Clone)]
pub struct PatternHit<'p, 't, L> {
    pub label: &'p L,
    /// Byte span of the whole match
    pub span: Range<usize>,
    /// First capture group, when the pattern has one and it participated
    pub group: Option<&'t str>,
}

impl<L> OrderedPatterns<L> {
    /// Compile regex sources into a table.
    pub fn compile<I, P>(
        entries: I,
        order: PatternOrder,
        case_insensitive: bool,
    ) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = (P, L)>,
        P: Into<String>,
    {
        let mut compiled = entries
            .into_iter()
            .map(|(pattern, label)| {
                let pattern: String = pattern.into();
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|error| PatternError::Invalid {
                        pattern: pattern.clone(),
                        error,
                    })?;
                Ok(PatternEntry {
                    pattern,
                    regex,
                    label,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        if order == PatternOrder::LongestSource {
            compiled.sort_by_key(|e| Reverse(e.pattern.chars().count()));
        }

        Ok(Self { entries: compiled })
    }

    /// Table of plain substrings, tried in declaration order.
    pub fn literals<I, S>(entries: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = (S, L)>,
        S: AsRef<str>,
    {
        Self::compile(
            entries
                .into_iter()
                .map(|(literal, label)| (regex::escape(&literal.as_ref().to_lowercase()), label)),
            PatternOrder::Declared,
            false,
        )
    }

    /// Scan entries in priority order and return the first that matches.
    pub fn first_match<'p, 't>(&'p self, text: &'t str) -> Option<PatternHit<'p, 't, L>> {
        self.entries.iter().find_map(|entry| {
            let caps = entry.regex.captures(text)?;
            let whole = caps.get(0)?;
            Some(PatternHit {
                label: &entry.label,
                span: whole.range(),
                group: caps.get(1).map(|m| m.as_str()),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_order_first_match_wins() {
        let table = OrderedPatterns::literals(vec![("сталь", "steel"), ("нержавеющая сталь", "stainless")])
            .unwrap();
        let hit = table.first_match("нержавеющая сталь aisi").unwrap();
        assert_eq!(*hit.label, "steel");
        assert_eq!(hit.span, 23..33);
    }

    #[test]
    fn test_longest_source_first() {
        let table = OrderedPatterns::compile(
            vec![(r"\bооо\b", "ООО"), (r"\bип\s+ооо\b", "ИП ООО")],
            PatternOrder::LongestSource,
            true,
        )
        .unwrap();
        let hit = table.first_match("ИП ООО ромашка").unwrap();
        assert_eq!(*hit.label, "ИП ООО");
        assert_eq!(*table.first_match("ООО ромашка").unwrap().label, "ООО");
    }

    #[test]
    fn test_capture_group_exposed() {
        let table =
            OrderedPatterns::compile(vec![(r"ду\s*(\d{1,4})", "dn")], PatternOrder::Declared, false)
                .unwrap();
        let hit = table.first_match("кран ду 50").unwrap();
        assert_eq!(hit.group, Some("50"));
    }

    #[test]
    fn test_invalid_pattern_reported() {
        let err = OrderedPatterns::compile(vec![("(unclosed", ())], PatternOrder::Declared, false)
            .unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_no_match() {
        let table = OrderedPatterns::literals(vec![("epdm", "EPDM")]).unwrap();
        assert!(table.first_match("nbr").is_none());
        assert_eq!(table.len(), 1);
    }
}
