//! Tokenization and lemmatization of product descriptions.

use crate::script::normalize_script;
use regex::{Match, Regex};
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Words with optional internal hyphens ("трех-ходовой", "ball-valve").
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[а-яА-Яa-zA-ZЁё]+(?:-[а-яА-Яa-zA-ZЁё]+)*\b").expect("valid word regex")
});

/// Standard Russian stop-word list.
const RUSSIAN_STOP_WORDS: &[&str] = &[
    "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она",
    "так", "его", "но", "да", "ты", "к", "у", "же", "вы", "за", "бы", "по", "только", "ее",
    "мне", "было", "вот", "от", "меня", "еще", "нет", "о", "из", "ему", "теперь", "когда",
    "даже", "ну", "вдруг", "ли", "если", "уже", "или", "ни", "быть", "был", "него", "до",
    "вас", "нибудь", "опять", "уж", "вам", "ведь", "там", "потом", "себя", "ничего", "ей",
    "может", "они", "тут", "где", "есть", "надо", "ней", "для", "мы", "тебя", "их", "чем",
    "была", "сам", "чтоб", "без", "будто", "чего", "раз", "тоже", "себе", "под", "будет", "ж",
    "тогда", "кто", "этот", "того", "потому", "этого", "какой", "совсем", "ним", "здесь",
    "этом", "один", "почти", "мой", "тем", "чтобы", "нее", "сейчас", "были", "куда", "зачем",
    "всех", "никогда", "можно", "при", "наконец", "два", "об", "другой", "хоть", "после",
    "над", "больше", "тот", "через", "эти", "нас", "про", "всего", "них", "какая", "много",
    "разве", "три", "эту", "моя", "впрочем", "хорошо", "свою", "этой", "перед", "иногда",
    "лучше", "чуть", "том", "нельзя", "такой", "им", "более", "всегда", "конечно", "всю",
    "между",
];

const MIN_TOKEN_CHARS: usize = 2;

/// Iterate over word tokens of `text`, with byte spans.
pub fn word_tokens(text: &str) -> impl Iterator<Item = Match<'_>> {
    WORD_RE.find_iter(text)
}

/// Reduces a lowercase token to its dictionary form.
pub trait MorphAnalyzer: Send + Sync {
    fn normal_form(&self, token: &str) -> String;

    /// Prefix shared by the inflected forms of `token`, used for literal
    /// occurrence search.
    fn stem(&self, token: &str) -> String {
        self.normal_form(token)
    }
}

/// Snowball-based analyzer: Russian for Cyrillic tokens, English for Latin ones.
pub struct SnowballAnalyzer {
    russian: Stemmer,
    english: Stemmer,
}

impl Default for SnowballAnalyzer {
    fn default() -> Self {
        Self {
            russian: Stemmer::create(Algorithm::Russian),
            english: Stemmer::create(Algorithm::English),
        }
    }
}

impl MorphAnalyzer for SnowballAnalyzer {
    fn normal_form(&self, token: &str) -> String {
        let cyrillic = token.chars().filter(|c| matches!(*c, 'а'..='я' | 'ё')).count();
        let latin = token.chars().filter(|c| c.is_ascii_lowercase()).count();
        if cyrillic > 0 && cyrillic >= latin {
            self.russian.stem(token).into_owned()
        } else if latin > 0 {
            self.english.stem(token).into_owned()
        } else {
            token.to_string()
        }
    }
}

/// Dictionary analyzer over a `form -> lemma` table.
///
/// Words missing from the table go to the Snowball analyzer. When a form
/// belongs to several lemmas the first entry given wins.
pub struct DictionaryAnalyzer {
    lemmas: HashMap<String, String>,
    fallback: SnowballAnalyzer,
}

impl DictionaryAnalyzer {
    /// Build from `(form, lemma)` pairs. Every lemma is also its own form.
    pub fn new<I, F, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (F, L)>,
        F: AsRef<str>,
        L: AsRef<str>,
    {
        let mut lemmas = HashMap::new();
        for (form, lemma) in entries {
            let form = form.as_ref().trim().to_lowercase();
            let lemma = lemma.as_ref().trim().to_lowercase();
            if form.is_empty() || lemma.is_empty() {
                continue;
            }
            lemmas.entry(lemma.clone()).or_insert_with(|| lemma.clone());
            lemmas.entry(form).or_insert(lemma);
        }
        Self {
            lemmas,
            fallback: SnowballAnalyzer::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl MorphAnalyzer for DictionaryAnalyzer {
    fn normal_form(&self, token: &str) -> String {
        match self.lemmas.get(token) {
            Some(lemma) => lemma.clone(),
            None => self.fallback.normal_form(token),
        }
    }

    fn stem(&self, token: &str) -> String {
        self.fallback.normal_form(token)
    }
}

/// Turns free text into an ordered list of lemmas.
pub struct Lemmatizer {
    analyzer: Box<dyn MorphAnalyzer>,
    stop_words: HashSet<&'static str>,
}

impl Lemmatizer {
    pub fn new(analyzer: impl MorphAnalyzer + 'static) -> Self {
        Self {
            analyzer: Box::new(analyzer),
            stop_words: RUSSIAN_STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Normal form of a single word, lowercased first.
    ///
    /// Used to project lexicon terms into the same space as extracted lemmas.
    pub fn normal_form(&self, word: &str) -> String {
        self.analyzer.normal_form(&word.trim().to_lowercase())
    }

    /// Search stem of a single word, lowercased first.
    pub fn stem(&self, word: &str) -> String {
        self.analyzer.stem(&word.trim().to_lowercase())
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Script-normalize, lowercase, tokenize, drop stop words and one-letter
    /// tokens, then reduce every token to its normal form.
    pub fn extract_lemmas(&self, text: &str) -> Vec<String> {
        self.tagged_tokens(text)
            .into_iter()
            .map(|(_, lemma)| lemma)
            .collect()
    }

    /// Like [`Lemmatizer::extract_lemmas`], paired with the lowercase token
    /// each lemma came from.
    pub fn tagged_tokens(&self, text: &str) -> Vec<(String, String)> {
        let text = normalize_script(text).to_lowercase();
        word_tokens(&text)
            .map(|m| m.as_str())
            .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS && !self.is_stop_word(token))
            .map(|token| (token.to_string(), self.analyzer.normal_form(token)))
            .collect()
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new(SnowballAnalyzer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Identity;

    impl MorphAnalyzer for Identity {
        fn normal_form(&self, token: &str) -> String {
            token.to_string()
        }
    }

    #[test]
    fn test_tokens_keep_internal_hyphens() {
        let text = "кран трех-ходовой, ball-valve";
        let tokens: Vec<_> = word_tokens(text).map(|m| m.as_str()).collect();
        assert_eq!(tokens, vec!["кран", "трех-ходовой", "ball-valve"]);
    }

    #[test]
    fn test_stop_words_and_short_tokens_dropped() {
        let lemmatizer = Lemmatizer::new(Identity);
        let lemmas = lemmatizer.extract_lemmas("Кран и клапан для воды, в т ч задвижки");
        assert_eq!(lemmas, vec!["кран", "клапан", "воды", "задвижки"]);
    }

    #[test]
    fn test_mixed_script_normalized_before_tokenizing() {
        let lemmatizer = Lemmatizer::new(Identity);
        assert_eq!(lemmatizer.extract_lemmas("KРАНЫ"), vec!["краны"]);
    }

    #[test]
    fn test_snowball_reduces_inflections() {
        let lemmatizer = Lemmatizer::default();
        assert_eq!(lemmatizer.extract_lemmas("краны клапаном"), vec!["кран", "клапан"]);
        assert_eq!(lemmatizer.normal_form("Кран"), "кран");
        assert_eq!(lemmatizer.normal_form("valves"), lemmatizer.normal_form("valve"));
    }

    #[test]
    fn test_dictionary_gives_dictionary_forms() {
        let analyzer = DictionaryAnalyzer::new(vec![
            ("краны", "кран"),
            ("шаровые", "шаровой"),
            ("стальные", "стальной"),
            ("задвижки", "задвижка"),
        ]);
        let lemmatizer = Lemmatizer::new(analyzer);
        assert_eq!(
            lemmatizer.extract_lemmas("краны шаровые стальные задвижки"),
            vec!["кран", "шаровой", "стальной", "задвижка"]
        );
        assert_eq!(lemmatizer.normal_form("Задвижка"), "задвижка");
        // unknown words fall back to Snowball
        assert_eq!(lemmatizer.normal_form("клапанами"), "клапан");
    }

    #[test]
    fn test_dictionary_stem_stays_a_prefix() {
        let lemmatizer = Lemmatizer::new(DictionaryAnalyzer::new(vec![("задвижки", "задвижка")]));
        assert_eq!(lemmatizer.normal_form("задвижки"), "задвижка");
        assert_eq!(lemmatizer.stem("задвижка"), "задвижк");
        assert_eq!(lemmatizer.stem("задвижки"), "задвижк");
    }

    #[test]
    fn test_first_lemma_of_ambiguous_form_wins() {
        let analyzer = DictionaryAnalyzer::new(vec![("стали", "сталь"), ("стали", "стать"), (" ", "x")]);
        assert_eq!(analyzer.normal_form("стали"), "сталь");
        assert_eq!(analyzer.normal_form("стать"), "стать");
        assert_eq!(analyzer.len(), 3);
    }

    #[test]
    fn test_tagged_tokens_keep_surface_form() {
        let lemmatizer = Lemmatizer::default();
        assert_eq!(
            lemmatizer.tagged_tokens("Краны и клапаны"),
            vec![
                ("краны".to_string(), "кран".to_string()),
                ("клапаны".to_string(), "клапан".to_string())
            ]
        );
    }

    #[test]
    fn test_digits_are_not_words() {
        let lemmatizer = Lemmatizer::new(Identity);
        // "ду50" has no word boundary between letters and digits
        assert_eq!(lemmatizer.extract_lemmas("ду50 12345 кран"), vec!["кран"]);
    }
}
