//! Company-name canonicalization for declaration parties.
//!
//! Splits a raw exporter/importer name into its legal-form code and the
//! residual name:
//! 1. Repair legal forms typed glued to the name (`ООО"Ромашка"`)
//! 2. Strip punctuation noise, lowercase
//! 3. Resolve "on behalf of" / "via" phrasing to the right party
//! 4. Remove the most specific legal-form designator
//! 5. Tidy leftover periods, commas and whitespace

pub mod forms;

use forms::{FUSED_FORM_CANDIDATES, LEGAL_FORM_PATTERNS, ON_BEHALF_MARKERS, VIA_MARKERS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tradeflow_features::{collapse_whitespace, OrderedPatterns, PatternError, PatternOrder};
use tradeflow_model::NormalizedCompany;

/// Characters removed before any matching. `/` is removed only after
/// directive markers such as "b/o" have been searched.
const NOISE_CHARS: &[char] = &[
    '"', ',', '«', '»', '(', ')', '&', '?', '<', '>', '“', '”', '|', '-', '\'',
];

/// Configuration for company normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    /// Run legal-form extraction on the substring kept after an
    /// "on behalf of" or "via" cut
    pub extract_after_directive: bool,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            extract_after_directive: true,
        }
    }
}

/// Reusable company normalizer with all patterns compiled.
pub struct CompanyNormalizer {
    config: CompanyConfig,
    fused_before_quote: Vec<Regex>,
    fused_before_word: Vec<Regex>,
    on_behalf: Vec<Regex>,
    via: Vec<Regex>,
    legal_forms: OrderedPatterns<&'static str>,
}

static DEFAULT_NORMALIZER: LazyLock<CompanyNormalizer> = LazyLock::new(|| {
    CompanyNormalizer::new(CompanyConfig::default()).expect("built-in legal-form tables compile")
});

/// Normalize a company name with the default configuration.
pub fn normalize_company(raw: Option<&str>) -> NormalizedCompany {
    DEFAULT_NORMALIZER.normalize(raw)
}

fn compile(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|error| PatternError::Invalid {
        pattern: pattern.to_string(),
        error,
    })
}

fn marker_regex(marker: &str) -> Result<Regex, PatternError> {
    // Markers go through the same cleanup as the names they are searched in.
    compile(&format!(r"\b{}\b", regex::escape(&clean(marker))))
}

/// Strip noise characters, collapse whitespace, lowercase.
fn clean(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !NOISE_CHARS.contains(c)).collect();
    collapse_whitespace(&stripped).to_lowercase()
}

fn strip_slashes(text: &str) -> String {
    collapse_whitespace(&text.replace('/', ""))
}

impl CompanyNormalizer {
    pub fn new(config: CompanyConfig) -> Result<Self, PatternError> {
        let mut candidates = FUSED_FORM_CANDIDATES.to_vec();
        candidates.sort_by_key(|c| std::cmp::Reverse(c.chars().count()));

        let fused_before_quote = candidates
            .iter()
            .map(|c| compile(&format!(r#"(?i)\b({})(["«“])"#, regex::escape(c))))
            .collect::<Result<Vec<_>, _>>()?;
        // Upper-case abbreviation followed by a digit or a capitalized word;
        // all-caps words starting with the same letters are left intact.
        let fused_before_word = candidates
            .iter()
            .map(|c| compile(&format!(r"\b({})(\p{{Lu}}\p{{Ll}}|\d)", regex::escape(c))))
            .collect::<Result<Vec<_>, _>>()?;

        let on_behalf = ON_BEHALF_MARKERS
            .iter()
            .map(|m| marker_regex(m))
            .collect::<Result<Vec<_>, _>>()?;
        let via = VIA_MARKERS
            .iter()
            .map(|m| marker_regex(m))
            .collect::<Result<Vec<_>, _>>()?;

        let legal_forms = OrderedPatterns::compile(
            LEGAL_FORM_PATTERNS.iter().copied(),
            PatternOrder::LongestSource,
            true,
        )?;

        Ok(Self {
            config,
            fused_before_quote,
            fused_before_word,
            on_behalf,
            via,
            legal_forms,
        })
    }

    /// Split a raw party name into legal form and residual name.
    ///
    /// A missing name yields `(None, None)`; a name that is only a legal form
    /// yields an empty residual name.
    pub fn normalize(&self, raw: Option<&str>) -> NormalizedCompany {
        let Some(raw) = raw else {
            return NormalizedCompany::missing();
        };

        let separated = self.separate_fused_forms(raw);
        let cleaned = clean(&separated);
        let (party, directed) = self.resolve_directive(&cleaned);
        let party = strip_slashes(&party);

        let (legal_form, name) = if directed && !self.config.extract_after_directive {
            (None, party)
        } else {
            self.strip_legal_form(&party)
        };

        let name = collapse_whitespace(&name.replace(['.', ','], ""));
        tracing::trace!(raw, legal_form = ?legal_form, name = %name, "normalized company");

        NormalizedCompany {
            legal_form: legal_form.map(str::to_string),
            name: Some(name),
        }
    }

    /// Insert a space between a legal form and a name typed against it.
    fn separate_fused_forms(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for (quote, word) in self.fused_before_quote.iter().zip(&self.fused_before_word) {
            text = quote.replace_all(&text, "$1 $2").into_owned();
            text = word.replace_all(&text, "$1 $2").into_owned();
        }
        text
    }

    /// Cut the cleaned name down to the party it actually designates.
    /// The flag tells whether a marker was found.
    fn resolve_directive(&self, cleaned: &str) -> (String, bool) {
        if let Some(m) = self.on_behalf.iter().find_map(|re| re.find(cleaned)) {
            return (cleaned[m.end()..].trim().to_string(), true);
        }
        if let Some(m) = self.via.iter().find_map(|re| re.find(cleaned)) {
            return (cleaned[..m.start()].trim().to_string(), true);
        }
        (cleaned.to_string(), false)
    }

    /// Remove the first designator of the most specific matching pattern.
    fn strip_legal_form(&self, name: &str) -> (Option<&'static str>, String) {
        let Some(hit) = self.legal_forms.first_match(name) else {
            return (None, name.to_string());
        };
        let code = *hit.label;
        let mut residual = String::with_capacity(name.len());
        residual.push_str(&name[..hit.span.start]);
        residual.push_str(&name[hit.span.end..]);
        let residual = residual
            .trim()
            .trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '-')
            .to_string();
        (Some(code), residual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn norm(raw: &str) -> (Option<String>, String) {
        let result = normalize_company(Some(raw));
        (result.legal_form, result.name.unwrap_or_default())
    }

    fn expect(form: Option<&str>, name: &str) -> (Option<String>, String) {
        (form.map(str::to_string), name.to_string())
    }

    #[test]
    fn test_quoted_name_with_leading_form() {
        assert_eq!(norm(r#"ООО "Ромашка""#), expect(Some("ООО"), "ромашка"));
    }

    #[test]
    fn test_trailing_form() {
        assert_eq!(norm("Рога и копыта ООО"), expect(Some("ООО"), "рога и копыта"));
    }

    #[test]
    fn test_fused_forms_are_separated() {
        assert_eq!(norm(r#"ООО"Ромашка""#), expect(Some("ООО"), "ромашка"));
        assert_eq!(norm("ОООРомашка"), expect(Some("ООО"), "ромашка"));
        assert_eq!(norm("ТОО«Альфа»"), expect(Some("ТОО"), "альфа"));
    }

    #[test]
    fn test_all_caps_words_not_split() {
        assert_eq!(norm("ЗАОЗЕРНЫЙ ЗАВОД"), expect(None, "заозерный завод"));
    }

    #[test]
    fn test_spelled_out_forms() {
        assert_eq!(
            norm("Индивидуальный Предприниматель Иванов"),
            expect(Some("ИП"), "иванов")
        );
        assert_eq!(
            norm("Общество с ограниченной ответственностью \"Вектор\""),
            expect(Some("ООО"), "вектор")
        );
        assert_eq!(norm("ACME LIMITED LIABILITY COMPANY"), expect(Some("LLC"), "acme"));
    }

    #[test]
    fn test_compound_form_beats_generic() {
        assert_eq!(norm("ИП ООО Восток"), expect(Some("ИП ООО"), "восток"));
    }

    #[test]
    fn test_dotted_international_forms() {
        assert_eq!(norm("ZETKAMA SP. Z O.O."), expect(Some("SP ZOO"), "zetkama"));
        assert_eq!(norm("Armatury Group, a.s."), expect(Some("AS"), "armatury group"));
    }

    #[test]
    fn test_on_behalf_keeps_principal() {
        assert_eq!(
            norm(r#"ООО "Лютик" по поручению ООО "Ромашка""#),
            expect(Some("ООО"), "ромашка")
        );
    }

    #[test]
    fn test_via_keeps_party_before_marker() {
        assert_eq!(norm("ТОО Альфа через ООО Бета"), expect(Some("ТОО"), "альфа"));
    }

    #[test]
    fn test_directive_without_extraction() {
        let normalizer = CompanyNormalizer::new(CompanyConfig {
            extract_after_directive: false,
        })
        .unwrap();
        let result = normalizer.normalize(Some(r#"ООО "Лютик" по поручению ООО "Ромашка""#));
        assert_eq!(result.legal_form, None);
        assert_eq!(result.name.as_deref(), Some("ооо ромашка"));
    }

    #[test]
    fn test_markers_are_whole_words() {
        // "by" inside "ruby" is not a directive
        assert_eq!(norm("Ruby Valves"), expect(None, "ruby valves"));
    }

    #[test]
    fn test_slash_marker_does_not_match_plain_word() {
        assert_eq!(norm("Hai Bo Trading Co"), expect(Some("CO"), "hai bo trading"));
        assert_eq!(norm("X Ltd b/o Y Co"), expect(Some("CO"), "y"));
    }

    #[test]
    fn test_slashes_removed_from_name() {
        assert_eq!(norm("Alpha/Omega LLC"), expect(Some("LLC"), "alphaomega"));
    }

    #[test]
    fn test_each_on_behalf_marker() {
        assert_eq!(norm("ООО Лютик для ООО Ромашка"), expect(Some("ООО"), "ромашка"));
        assert_eq!(norm("Alpha Ltd for Beta GmbH"), expect(Some("GMBH"), "beta"));
        assert_eq!(norm("Gamma LLC by order Delta Ltd"), expect(Some("LTD"), "delta"));
        assert_eq!(norm("Omega SRL by Sigma SA"), expect(Some("SA"), "sigma"));
        assert_eq!(norm("ТОО Альфа по поруч ТОО Бета"), expect(Some("ТОО"), "бета"));
    }

    #[test]
    fn test_form_only_name() {
        assert_eq!(norm("LLC"), expect(Some("LLC"), ""));
    }

    #[test]
    fn test_missing_name() {
        assert_eq!(normalize_company(None), NormalizedCompany::missing());
    }

    #[test]
    fn test_second_pass_finds_no_form() {
        for raw in [r#"ООО "Ромашка""#, "Рога и копыта ООО", "ACME LLC"] {
            let first = normalize_company(Some(raw));
            let second = normalize_company(first.name.as_deref());
            assert_eq!(second.legal_form, None, "input {raw}");
            assert_eq!(second.name, first.name);
        }
    }
}
