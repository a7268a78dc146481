//! File-backed collaborators of the processing core.
//!
//! Provides the `LexiconStore` trait for the tagging store and its CSV
//! implementation, the brand alias and lemma dictionary loaders, and
//! JSON-lines record I/O. The core itself never touches files; it only receives snapshots.

pub mod records;

pub use records::{read_records, read_records_from, write_records, write_records_to};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tradeflow_model::{BrandAliasIndex, LexiconError, TermLexicon, TermTag};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid JSON record at line {line}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize record {index}")]
    Serialize {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Lexicon(#[from] LexiconError),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Persistent tagging store.
///
/// The classifier never sees the store; callers load a snapshot before a run
/// and save after tagging.
pub trait LexiconStore {
    /// Load the current lexicon snapshot.
    fn load(&self) -> Result<TermLexicon, StoreError>;

    /// Replace the stored lexicon.
    fn save(&self, lexicon: &TermLexicon) -> Result<(), StoreError>;

    /// Store name for logging.
    fn name(&self) -> &'static str;
}

/// Tag `word` (or untag it for `None`) and persist the store.
///
/// Returns the tag the word had before.
pub fn retag<S: LexiconStore>(
    store: &S,
    word: &str,
    tag: Option<TermTag>,
) -> Result<Option<TermTag>, StoreError> {
    let mut lexicon = store.load()?;
    let previous = lexicon.tag_of(word);
    match tag {
        Some(tag) => lexicon.tag(word, tag),
        None => {
            lexicon.untag(word);
        }
    }
    store.save(&lexicon)?;
    tracing::info!(
        store = store.name(),
        word,
        from = previous.map(|t| t.as_str()),
        to = tag.map(|t| t.as_str()),
        "tag updated"
    );
    Ok(previous)
}

#[derive(Debug, Serialize, Deserialize)]
struct TagRow {
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

/// Tagging store kept as a `word,tag` CSV file.
#[derive(Debug, Clone)]
pub struct CsvLexiconStore {
    path: PathBuf,
}

impl CsvLexiconStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LexiconStore for CsvLexiconStore {
    /// A missing file is an empty lexicon. Rows with blank words or unknown
    /// tags are skipped.
    fn load(&self) -> Result<TermLexicon, StoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no tagging store yet, starting empty");
            return Ok(TermLexicon::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<TagRow>() {
            let row = row?;
            match (row.word, row.tag.as_deref().and_then(TermTag::parse)) {
                (Some(word), Some(tag)) => rows.push((word, tag)),
                _ => skipped += 1,
            }
        }

        let lexicon = TermLexicon::from_tagged(rows)?;
        tracing::info!(
            path = %self.path.display(),
            approved = lexicon.approved().len(),
            rejected = lexicon.rejected().len(),
            skipped,
            "lexicon loaded"
        );
        Ok(lexicon)
    }

    fn save(&self, lexicon: &TermLexicon) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        for (word, tag) in lexicon.entries() {
            writer.serialize(TagRow {
                word: Some(word.to_string()),
                tag: Some(tag.as_str().to_string()),
            })?;
        }
        writer
            .flush()
            .map_err(|source| StoreError::io(&self.path, source))?;
        tracing::debug!(path = %self.path.display(), terms = lexicon.len(), "lexicon saved");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

#[derive(Debug, Deserialize)]
struct AliasRow {
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    aliases: Option<String>,
}

/// Load a `brand,aliases` CSV dictionary (aliases comma-separated in one cell).
///
/// Rows missing either cell are dropped.
pub fn load_brand_aliases(path: impl AsRef<Path>) -> Result<BrandAliasIndex, StoreError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let rows = reader
        .deserialize::<AliasRow>()
        .map(|row| row.map(|r| (r.brand, r.aliases)))
        .collect::<Result<Vec<_>, csv::Error>>()?;
    let index = BrandAliasIndex::from_rows(rows);
    tracing::info!(
        path = %path.display(),
        aliases = index.len(),
        brands = index.brands().len(),
        "brand aliases loaded"
    );
    Ok(index)
}

/// Load a tab-separated `lemma<TAB>form` lemmatization list.
///
/// Returns `(form, lemma)` pairs in file order. Lines with fewer than two
/// cells are dropped.
pub fn load_lemma_dictionary(path: impl AsRef<Path>) -> Result<Vec<(String, String)>, StoreError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut pairs = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let (Some(lemma), Some(form)) = (row.get(0), row.get(1)) {
            if !lemma.is_empty() && !form.is_empty() {
                pairs.push((form.to_string(), lemma.to_string()));
            }
        }
    }
    tracing::info!(path = %path.display(), forms = pairs.len(), "lemma dictionary loaded");
    Ok(pairs)
}
