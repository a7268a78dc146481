//! Negation-span detection for rejected terms.
//!
//! Declarations routinely say what a product is *not* ("не является клапаном",
//! "без уплотнений"). An occurrence of a rejected term only counts against the
//! record when it sits outside every negation span.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use tradeflow_features::word_tokens;

/// Context templates; `{term}` is replaced by the escaped term stem.
/// Rule names are `NEG_<1-based index>`.
const NEGATION_TEMPLATES: &[&str] = &[
    r"\bне\s+явля\w*\s+{term}\w*\b",
    r"\bи\s+не\s+явля\w*\s+{term}\w*\b",
    r"\bне\s+\w{0,3}\s*явля\w*\s+{term}\w*\b",
    r"\bне\b[^,;:.]{0,80}\b{term}\w*\b",
    r"\bбез\b[^,;:.]{0,80}\b{term}\w*\b",
    r"\bне\s+содерж\w*\b[^,;:.]{0,80}\b{term}\w*\b",
    r"\bкроме\b[^,;:.]{0,80}\b{term}\w*\b",
    r"\bза\s+исключением\b[^,;:.]{0,80}\b{term}\w*\b",
    r"\bисключая\b[^,;:.]{0,80}\b{term}\w*\b",
    r"\b{term}\w*\b[^,;:.]{0,80}\bне\s+(предусмотр\w*|относ\w*|явля\w*)\b",
];

const NEGATORS: &[&str] = &["не", "ни", "без"];
const EXCEPTIONS: &[&str] = &["кроме", "исключая"];

pub(crate) const FALLBACK_NEGATOR: &str = "NEG_FALLBACK_LEFT_NEGATOR";
pub(crate) const FALLBACK_EXCEPTION: &str = "NEG_FALLBACK_EXCEPTION";

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.;]|\s[—–-]\s").expect("valid sentence regex"));

/// A region of text negating a term, and the rule that found it.
#[derive(Debug, Clone)]
pub(crate) struct NegationSpan {
    range: Range<usize>,
    rule: String,
}

/// Compiled templates for one term.
pub(crate) struct NegationRules {
    templates: Vec<(String, Regex)>,
    window: usize,
}

impl NegationRules {
    pub(crate) fn for_stem(stem: &str, window: usize) -> Result<Self, regex::Error> {
        let escaped = regex::escape(stem);
        let templates = NEGATION_TEMPLATES
            .iter()
            .enumerate()
            .map(|(i, template)| {
                let regex = Regex::new(&template.replace("{term}", &escaped))?;
                Ok((format!("NEG_{}", i + 1), regex))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { templates, window })
    }

    /// Every template match in `text`, template order first.
    pub(crate) fn spans(&self, text: &str) -> Vec<NegationSpan> {
        self.templates
            .iter()
            .flat_map(|(rule, regex)| {
                regex.find_iter(text).map(move |m| NegationSpan {
                    range: m.range(),
                    rule: rule.clone(),
                })
            })
            .collect()
    }

    /// Decide whether one occurrence is negated; returns the deciding rule.
    pub(crate) fn negated_by(
        &self,
        text: &str,
        occurrence: &Range<usize>,
        spans: &[NegationSpan],
    ) -> Option<String> {
        if let Some(span) = spans.iter().find(|s| overlaps(&s.range, occurrence)) {
            return Some(span.rule.clone());
        }
        self.fallback(text, occurrence).map(str::to_string)
    }

    /// Look a few tokens to the left of the occurrence within its sentence.
    fn fallback(&self, text: &str, occurrence: &Range<usize>) -> Option<&'static str> {
        let sentence = sentence_around(text, occurrence.start);
        let tokens: Vec<_> = word_tokens(&text[sentence.clone()])
            .map(|m| (m.start() + sentence.start, m.end() + sentence.start, m.as_str()))
            .collect();

        let idx = tokens
            .iter()
            .position(|(start, end, _)| *start <= occurrence.start && occurrence.start < *end)?;
        let left = &tokens[idx.saturating_sub(self.window)..idx];

        if left.iter().any(|(_, _, t)| NEGATORS.contains(t)) {
            Some(FALLBACK_NEGATOR)
        } else if left.iter().any(|(_, _, t)| EXCEPTIONS.contains(t)) {
            Some(FALLBACK_EXCEPTION)
        } else {
            None
        }
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    !(a.end <= b.start || b.end <= a.start)
}

/// Byte range of the sentence or clause containing `pos`.
fn sentence_around(text: &str, pos: usize) -> Range<usize> {
    let mut start = 0;
    for m in SENTENCE_BREAK.find_iter(text) {
        if m.end() > pos {
            return start..m.end();
        }
        start = m.end();
    }
    start..text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occurrence(text: &str, needle: &str) -> Range<usize> {
        let start = text.find(needle).unwrap();
        start..start + needle.len()
    }

    #[test]
    fn test_template_not_a_valve() {
        let rules = NegationRules::for_stem("клапан", 6).unwrap();
        let text = "изделие не является клапаном";
        let spans = rules.spans(text);
        let rule = rules.negated_by(text, &occurrence(text, "клапаном"), &spans);
        assert_eq!(rule.as_deref(), Some("NEG_1"));
    }

    #[test]
    fn test_template_after_term() {
        let rules = NegationRules::for_stem("сильфон", 6).unwrap();
        let text = "сильфонное уплотнение не предусмотрено";
        let spans = rules.spans(text);
        let rule = rules.negated_by(text, &occurrence(text, "сильфонное"), &spans);
        assert_eq!(rule.as_deref(), Some("NEG_10"));
    }

    fn rule_for(stem: &str, text: &str, needle: &str) -> Option<String> {
        let rules = NegationRules::for_stem(stem, 6).unwrap();
        let spans = rules.spans(text);
        rules.negated_by(text, &occurrence(text, needle), &spans)
    }

    #[test]
    fn test_template_without() {
        assert_eq!(
            rule_for("клапан", "корпус без клапана", "клапана").as_deref(),
            Some("NEG_5")
        );
    }

    #[test]
    fn test_template_with_the_exception_of() {
        assert_eq!(
            rule_for("клапан", "арматура за исключением клапанов", "клапанов").as_deref(),
            Some("NEG_8")
        );
    }

    #[test]
    fn test_template_excluding() {
        assert_eq!(
            rule_for("клапан", "арматура, исключая клапаны", "клапаны").as_deref(),
            Some("NEG_9")
        );
    }

    #[test]
    fn test_fallback_exception_word() {
        // the colon stops the "кроме" template
        assert_eq!(
            rule_for("клапан", "арматура кроме: клапаны обратные", "клапаны").as_deref(),
            Some(FALLBACK_EXCEPTION)
        );
    }

    #[test]
    fn test_fallback_crosses_colon() {
        let rules = NegationRules::for_stem("клапан", 6).unwrap();
        let text = "в комплекте не используются: клапаны";
        let spans = rules.spans(text);
        assert!(spans.is_empty());
        let rule = rules.negated_by(text, &occurrence(text, "клапаны"), &spans);
        assert_eq!(rule.as_deref(), Some(FALLBACK_NEGATOR));
    }

    #[test]
    fn test_negation_does_not_cross_sentences() {
        let rules = NegationRules::for_stem("клапан", 6).unwrap();
        let text = "не окрашено; клапан обратный";
        let spans = rules.spans(text);
        assert_eq!(rules.negated_by(text, &occurrence(text, "клапан"), &spans), None);
    }

    #[test]
    fn test_negator_outside_window() {
        let rules = NegationRules::for_stem("клапан", 2).unwrap();
        let text = "не: один два три клапан";
        let spans = rules.spans(text);
        assert_eq!(rules.negated_by(text, &occurrence(text, "клапан"), &spans), None);
    }

    #[test]
    fn test_sentence_around() {
        let text = "первое. второе - третье";
        assert_eq!(&text[sentence_around(text, 0)], "первое.");
        let pos = text.find("третье").unwrap();
        assert_eq!(&text[sentence_around(text, pos)], "третье");
    }
}
