//! Lemma frequency tables for growing the tagging lexicon.

use serde::Serialize;
use std::collections::HashMap;
use tradeflow_features::{truncate_chars, Lemmatizer};
use tradeflow_model::{TermLexicon, TermTag};

const CONTEXT_CHARS: usize = 300;

/// One lemma seen in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabularyEntry {
    pub lemma: String,
    /// Most frequent surface form of the lemma
    pub form: String,
    pub count: usize,
    /// Existing tag of a lexicon term with this lemma
    pub tag: Option<TermTag>,
    /// Example texts the lemma was seen in
    pub contexts: Vec<String>,
}

/// Count lemma frequencies across `texts`.
///
/// Keeps up to `max_contexts` distinct example texts per lemma. Entries are
/// sorted by descending count, ties by lemma. Lexicon terms are matched
/// through their normal form, the way the classifier sees them.
pub fn harvest_vocabulary<'a, I>(
    texts: I,
    lemmatizer: &Lemmatizer,
    lexicon: &TermLexicon,
    max_contexts: usize,
) -> Vec<VocabularyEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let tags: HashMap<String, TermTag> = lexicon
        .entries()
        .map(|(term, tag)| (lemmatizer.normal_form(term), tag))
        .collect();

    let mut table: HashMap<String, VocabularyEntry> = HashMap::new();
    let mut forms: HashMap<String, HashMap<String, usize>> = HashMap::new();
    let mut documents = 0usize;

    for text in texts {
        documents += 1;
        let context = truncate_chars(text.trim(), CONTEXT_CHARS);
        for (token, lemma) in lemmatizer.tagged_tokens(text) {
            *forms.entry(lemma.clone()).or_default().entry(token).or_default() += 1;
            let entry = table.entry(lemma).or_insert_with_key(|lemma| VocabularyEntry {
                lemma: lemma.clone(),
                form: String::new(),
                count: 0,
                tag: tags.get(lemma).copied(),
                contexts: Vec::new(),
            });
            entry.count += 1;
            if entry.contexts.len() < max_contexts && !entry.contexts.iter().any(|c| c == context) {
                entry.contexts.push(context.to_string());
            }
        }
    }

    let mut entries: Vec<_> = table.into_values().collect();
    for entry in &mut entries {
        if let Some(counts) = forms.get(&entry.lemma) {
            // most frequent first, then alphabetical
            if let Some((form, _)) = counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            {
                entry.form = form.clone();
            }
        }
    }
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.lemma.cmp(&b.lemma)));
    tracing::debug!(documents, lemmas = entries.len(), "vocabulary harvested");
    entries
}
