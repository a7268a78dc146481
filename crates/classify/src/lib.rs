//! Lexicon-driven product classification with negation handling.
//!
//! A description is `rejected` when a rejected term occurs outside every
//! negation span, `approved` when an approved lemma is present, and
//! `undetermined` otherwise. Rejection always beats approval.

mod negation;
pub mod vocab;

pub use vocab::{harvest_vocabulary, VocabularyEntry};

use negation::NegationRules;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use std::sync::LazyLock;
use thiserror::Error;
use tradeflow_features::{normalize_script, truncate_chars, Lemmatizer};
use tradeflow_model::{ClassificationLabel, ClassificationResult, TermLexicon};

/// Stems shorter than this are too loose for prefix search; the full term is used instead.
const MIN_STEM_CHARS: usize = 3;

static WORD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("cannot compile pattern for term '{term}'")]
    Pattern {
        term: String,
        #[source]
        error: regex::Error,
    },

    #[error("approved '{approved}' and rejected '{rejected}' share the normal form '{lemma}'")]
    Conflict {
        approved: String,
        rejected: String,
        lemma: String,
    },
}

/// Configuration for the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Tokens inspected to the left of an occurrence by the fallback check
    pub negation_window: usize,
    /// Characters kept in `text_preview`
    pub preview_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            negation_window: 6,
            preview_chars: 200,
        }
    }
}

struct RejectedTerm {
    term: String,
    stem: String,
    occurrence: Regex,
    rules: NegationRules,
}

/// Immutable classifier over one lexicon snapshot.
pub struct Classifier {
    lemmatizer: Lemmatizer,
    config: ClassifierConfig,
    /// normal form -> approved term
    approved: HashMap<String, String>,
    /// sorted by term
    rejected: Vec<RejectedTerm>,
    /// normal form -> indices into `rejected`
    rejected_by_lemma: HashMap<String, Vec<usize>>,
    /// search stem -> indices into `rejected`
    rejected_by_stem: HashMap<String, Vec<usize>>,
}

impl Classifier {
    pub fn new(
        lexicon: &TermLexicon,
        lemmatizer: Lemmatizer,
        config: ClassifierConfig,
    ) -> Result<Self, ClassifyError> {
        let mut approved = HashMap::new();
        for term in lexicon.approved() {
            approved
                .entry(lemmatizer.normal_form(term))
                .or_insert_with(|| term.clone());
        }

        let mut rejected = Vec::with_capacity(lexicon.rejected().len());
        let mut rejected_by_lemma: HashMap<String, Vec<usize>> = HashMap::new();
        let mut rejected_by_stem: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, term) in lexicon.rejected().iter().enumerate() {
            let lemma = lemmatizer.normal_form(term);
            if let Some(approved_term) = approved.get(&lemma) {
                return Err(ClassifyError::Conflict {
                    approved: approved_term.clone(),
                    rejected: term.clone(),
                    lemma,
                });
            }
            let search = lemmatizer.stem(term);
            let stem = if search.chars().count() >= MIN_STEM_CHARS && term.starts_with(&search) {
                search
            } else {
                term.clone()
            };
            let pattern_error = |error| ClassifyError::Pattern {
                term: term.clone(),
                error,
            };
            let occurrence =
                Regex::new(&format!(r"\b{}\w*\b", regex::escape(&stem))).map_err(pattern_error)?;
            let rules =
                NegationRules::for_stem(&stem, config.negation_window).map_err(pattern_error)?;
            rejected_by_lemma.entry(lemma).or_default().push(idx);
            rejected_by_stem.entry(stem.clone()).or_default().push(idx);
            rejected.push(RejectedTerm {
                term: term.clone(),
                stem,
                occurrence,
                rules,
            });
        }

        tracing::debug!(
            approved = approved.len(),
            rejected = rejected.len(),
            "classifier built"
        );

        Ok(Self {
            lemmatizer,
            config,
            approved,
            rejected,
            rejected_by_lemma,
            rejected_by_stem,
        })
    }

    /// Classify a product description. A missing text is `undetermined`.
    pub fn classify(&self, text: Option<&str>) -> ClassificationResult {
        let Some(raw) = text else {
            return ClassificationResult::undetermined();
        };

        let script_normalized = normalize_script(raw);
        let normalized = script_normalized.to_lowercase();
        let lemmas = self.lemmatizer.extract_lemmas(raw);

        let mut matched_approved: Vec<String> = Vec::new();
        for lemma in &lemmas {
            if let Some(term) = self.approved.get(lemma) {
                if !matched_approved.contains(term) {
                    matched_approved.push(term.clone());
                }
            }
        }

        let mut positive = Vec::new();
        let mut negated = Vec::new();
        let mut triggers = Vec::new();
        for idx in self.rejection_candidates(&lemmas, &normalized) {
            let term = &self.rejected[idx];
            match check_term(term, &normalized) {
                TermVerdict::Positive(local) => {
                    positive.push(term.term.clone());
                    triggers.extend(local);
                }
                TermVerdict::NegatedOnly(local) => {
                    negated.push(term.term.clone());
                    triggers.extend(local);
                }
                TermVerdict::Absent => {}
            }
        }

        let (label, reason) = if let Some(first) = positive.first() {
            (ClassificationLabel::Rejected, Some(first.clone()))
        } else if let Some(first) = matched_approved.first() {
            (ClassificationLabel::Approved, Some(first.clone()))
        } else {
            (ClassificationLabel::Undetermined, None)
        };

        ClassificationResult {
            label,
            reason,
            matched_approved,
            matched_rejected_positive: positive,
            matched_rejected_negated: negated,
            negation_triggers: triggers,
            text_preview: Some(truncate_chars(&script_normalized, self.config.preview_chars).to_string()),
        }
    }

    /// Rejected terms hit either through a lemma or as a word prefix in the
    /// normalized text, in term order.
    fn rejection_candidates(&self, lemmas: &[String], normalized: &str) -> BTreeSet<usize> {
        let mut candidates = BTreeSet::new();
        for lemma in lemmas {
            if let Some(ids) = self.rejected_by_lemma.get(lemma) {
                candidates.extend(ids.iter().copied());
            }
        }
        for word in WORD_RUN.find_iter(normalized) {
            let word = word.as_str();
            for (end, c) in word.char_indices() {
                if let Some(ids) = self.rejected_by_stem.get(&word[..end + c.len_utf8()]) {
                    candidates.extend(ids.iter().copied());
                }
            }
        }
        // Stems with non-word characters cannot be seen by the word scan.
        for (idx, term) in self.rejected.iter().enumerate() {
            if !term.stem.chars().all(is_word_char) && term.occurrence.is_match(normalized) {
                candidates.insert(idx);
            }
        }
        candidates
    }
}

fn check_term(term: &RejectedTerm, text: &str) -> TermVerdict {
    let occurrences: Vec<Range<usize>> =
        term.occurrence.find_iter(text).map(|m| m.range()).collect();
    if occurrences.is_empty() {
        return TermVerdict::Absent;
    }

    let spans = term.rules.spans(text);
    let mut positive = 0;
    let mut local = Vec::new();
    for occurrence in &occurrences {
        match term.rules.negated_by(text, occurrence, &spans) {
            Some(rule) => local.push(format!("{}:{}", term.term, rule)),
            None => positive += 1,
        }
    }

    tracing::trace!(
        term = %term.term,
        occurrences = occurrences.len(),
        positive,
        "rejected term checked"
    );

    if positive > 0 {
        TermVerdict::Positive(local)
    } else {
        TermVerdict::NegatedOnly(local)
    }
}

enum TermVerdict {
    Absent,
    Positive(Vec<String>),
    NegatedOnly(Vec<String>),
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tradeflow_features::DictionaryAnalyzer;
    use tradeflow_model::TermTag;

    fn classifier(approved: &[&str], rejected: &[&str]) -> Classifier {
        let rows = approved
            .iter()
            .map(|t| (*t, TermTag::Approved))
            .chain(rejected.iter().map(|t| (*t, TermTag::Rejected)));
        let lexicon = TermLexicon::from_tagged(rows).unwrap();
        Classifier::new(&lexicon, Lemmatizer::default(), ClassifierConfig::default()).unwrap()
    }

    fn assert_label_invariant(result: &ClassificationResult) {
        assert_eq!(
            result.label == ClassificationLabel::Rejected,
            !result.matched_rejected_positive.is_empty()
        );
    }

    #[test]
    fn test_missing_text_is_undetermined() {
        let c = classifier(&["кран"], &["клапан"]);
        let result = c.classify(None);
        assert_eq!(result, ClassificationResult::undetermined());
    }

    #[test]
    fn test_approved_by_lemma() {
        let c = classifier(&["кран"], &["клапан"]);
        let result = c.classify(Some("Краны шаровые стальные"));
        assert_eq!(result.label, ClassificationLabel::Approved);
        assert_eq!(result.reason.as_deref(), Some("кран"));
        assert_eq!(result.matched_approved, vec!["кран"]);
        assert_label_invariant(&result);
    }

    #[test]
    fn test_rejected_beats_approved() {
        let c = classifier(&["кран"], &["клапан"]);
        let result = c.classify(Some("Кран и клапан обратный"));
        assert_eq!(result.label, ClassificationLabel::Rejected);
        assert_eq!(result.reason.as_deref(), Some("клапан"));
        assert_eq!(result.matched_approved, vec!["кран"]);
        assert_label_invariant(&result);
    }

    #[test]
    fn test_negated_adjective_not_rejected() {
        let c = classifier(&["клапан"], &["шаровой"]);
        let result = c.classify(Some("клапан не является шаровым"));
        assert_ne!(result.label, ClassificationLabel::Rejected);
        assert_eq!(result.matched_rejected_negated, vec!["шаровой"]);
        assert_eq!(result.negation_triggers, vec!["шаровой:NEG_1"]);
        assert_label_invariant(&result);
    }

    #[test]
    fn test_declaration_stating_it_is_not_a_valve() {
        let c = classifier(&["кран"], &["клапан"]);
        let text = "АРМАТУРА ТРУБОПРОВОДНAЯ:КРАНЫ ШАРОВЫЕ, ДЛЯ УСТАНОВКИ НА ТРУБОПРОВОДАХ ВОДЫ И ГАЗА, \
                    КОРПУСЫ ИЗГОТОВЛЕНЫ ИЗ СТАЛИ МАРКИ СТ.20; И ЛАТУНИ МАРКИ ЛС59-1 НЕ СОДЕРЖИТ \
                    УПЛОТНЕНИЙ СИЛЬФОННОГО ТИПА И НЕ ЯВЛЯЮТСЯ КЛАПАНОМ";
        let result = c.classify(Some(text));
        assert_eq!(result.label, ClassificationLabel::Approved);
        assert_eq!(result.reason.as_deref(), Some("кран"));
        assert!(result.matched_rejected_positive.is_empty());
        assert_eq!(result.matched_rejected_negated, vec!["клапан"]);
        assert_label_invariant(&result);
    }

    #[test]
    fn test_positive_occurrence_wins_over_negated_one() {
        let c = classifier(&[], &["клапан"]);
        let result = c.classify(Some("клапан обратный; не является клапаном"));
        assert_eq!(result.label, ClassificationLabel::Rejected);
        assert_eq!(result.matched_rejected_positive, vec!["клапан"]);
        assert!(result.matched_rejected_negated.is_empty());
        assert_eq!(result.negation_triggers, vec!["клапан:NEG_1"]);
    }

    #[test]
    fn test_exception_marker() {
        let c = classifier(&["задвижка"], &["клапан"]);
        let result = c.classify(Some("задвижки, кроме клапанов"));
        assert_ne!(result.label, ClassificationLabel::Rejected);
        assert_eq!(result.negation_triggers, vec!["клапан:NEG_7"]);
    }

    #[test]
    fn test_negation_triggers_name_the_rule() {
        let c = classifier(&[], &["клапан"]);
        let cases = [
            ("корпус без клапана", "клапан:NEG_5"),
            ("арматура за исключением клапанов", "клапан:NEG_8"),
            ("арматура, исключая клапаны", "клапан:NEG_9"),
            ("арматура кроме: клапаны обратные", "клапан:NEG_FALLBACK_EXCEPTION"),
        ];
        for (text, trigger) in cases {
            let result = c.classify(Some(text));
            assert_eq!(result.label, ClassificationLabel::Undetermined, "text {text}");
            assert_eq!(result.matched_rejected_negated, vec!["клапан"], "text {text}");
            assert_eq!(result.negation_triggers, vec![trigger], "text {text}");
        }
    }

    #[test]
    fn test_terms_sharing_a_normal_form_conflict() {
        let lexicon = TermLexicon::from_tagged(vec![
            ("задвижка", TermTag::Approved),
            ("задвижки", TermTag::Rejected),
        ])
        .unwrap();
        let err = Classifier::new(&lexicon, Lemmatizer::default(), ClassifierConfig::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ClassifyError::Conflict { ref approved, ref rejected, .. }
                if approved == "задвижка" && rejected == "задвижки"
        ));
    }

    #[test]
    fn test_dictionary_lemmas_still_find_inflected_occurrences() {
        let lexicon = TermLexicon::from_tagged(vec![("задвижка", TermTag::Rejected)]).unwrap();
        let lemmatizer = Lemmatizer::new(DictionaryAnalyzer::new(vec![("задвижки", "задвижка")]));
        let c = Classifier::new(&lexicon, lemmatizer, ClassifierConfig::default()).unwrap();

        let result = c.classify(Some("Задвижки стальные"));
        assert_eq!(result.label, ClassificationLabel::Rejected);
        assert_eq!(result.reason.as_deref(), Some("задвижка"));

        let result = c.classify(Some("не является задвижкой"));
        assert_eq!(result.negation_triggers, vec!["задвижка:NEG_1"]);
    }

    #[test]
    fn test_homoglyphs_do_not_hide_rejected_terms() {
        let c = classifier(&[], &["клапан"]);
        // Latin K and A inside a Cyrillic word
        let result = c.classify(Some("KЛAПAН ОБРАТНЫЙ"));
        assert_eq!(result.label, ClassificationLabel::Rejected);
        assert_eq!(result.text_preview.as_deref(), Some("КЛАПАН ОБРАТНЫЙ"));
    }

    #[test]
    fn test_latin_terms() {
        let c = classifier(&[], &["valve"]);
        let result = c.classify(Some("Ball valves DN50"));
        assert_eq!(result.label, ClassificationLabel::Rejected);
        assert_eq!(result.reason.as_deref(), Some("valve"));
    }

    #[test]
    fn test_nothing_matched() {
        let c = classifier(&["кран"], &["клапан"]);
        let result = c.classify(Some("насос центробежный"));
        assert_eq!(result.label, ClassificationLabel::Undetermined);
        assert_eq!(result.reason, None);
        assert_label_invariant(&result);
    }

    #[test]
    fn test_rejected_reason_is_first_in_term_order() {
        let c = classifier(&[], &["фильтр", "клапан"]);
        let result = c.classify(Some("фильтр сетчатый и клапан"));
        assert_eq!(result.matched_rejected_positive, vec!["клапан", "фильтр"]);
        assert_eq!(result.reason.as_deref(), Some("клапан"));
    }
}
