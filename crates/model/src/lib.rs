//! Core domain model for tradeflow customs-declaration processing.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `TradeRecord`: One flat declaration row as produced by the record source
//! - `NormalizedCompany`: Legal form plus residual party name
//! - `TermLexicon`: Approved/rejected product terms from the tagging store
//! - `ClassificationResult`: Approval status of a product description
//! - `BrandAliasIndex` / `BrandAssignment`: Brand dictionary and per-record result
//! - `ExtractedAttributes`: Technical attributes parsed from free text
//! - `RecordOutcome`: All of the above for one record, plus its relevance

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Well-known field names of the unified declaration record.
pub mod fields {
    pub const DECL_NUMBER: &str = "decl_number";
    pub const EXPORTER_NAME: &str = "exporter_name";
    pub const IMPORTER_NAME: &str = "importer_name";
    pub const PROD_DETAILS: &str = "prod_details";
    pub const PROD_BRAND: &str = "prod_brand";
    pub const PROD_MAN: &str = "prod_man";
}

/// Errors raised while reading values out of a record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("field '{field}' holds a nested value where text was expected")]
    UnsupportedValue { field: String },
}

/// Errors raised while assembling a term lexicon.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexiconError {
    #[error("term '{term}' is tagged both approved and rejected")]
    Conflict { term: String },
}

/// A flat declaration record: field name to scalar value.
///
/// Missing fields, JSON nulls and blank strings all read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeRecord {
    fields: Map<String, Value>,
}

impl TradeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Read a field as text.
    ///
    /// Numbers and booleans are rendered with their JSON spelling. Arrays and
    /// objects are not text and produce [`RecordError::UnsupportedValue`].
    pub fn text(&self, name: &str) -> Result<Option<String>, RecordError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(Value::Array(_)) | Some(Value::Object(_)) => Err(RecordError::UnsupportedValue {
                field: name.to_string(),
            }),
        }
    }

    /// Read a boolean flag written by an upstream stage.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.fields.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "истина" => Some(true),
                "false" | "0" | "ложь" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Result of company-name canonicalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCompany {
    /// Canonical legal-form code (e.g. "ООО", "LLC"), if one was stripped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_form: Option<String>,

    /// Lowercased residual name; `None` only when the input was missing
    #[serde(default)]
    pub name: Option<String>,
}

impl NormalizedCompany {
    pub fn missing() -> Self {
        Self::default()
    }
}

/// Tag assigned to a term in the tagging store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermTag {
    Approved,
    Rejected,
}

impl TermTag {
    /// Parse a stored tag. Unknown tags yield `None` and are skipped by loaders.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Two disjoint sets of lowercase single-word terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermLexicon {
    approved: BTreeSet<String>,
    rejected: BTreeSet<String>,
}

impl TermLexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a lexicon from `(term, tag)` rows.
    ///
    /// Terms are trimmed and lowercased, blank terms are dropped. A term that
    /// shows up under both tags is a configuration error.
    pub fn from_tagged<I, S>(rows: I) -> Result<Self, LexiconError>
    where
        I: IntoIterator<Item = (S, TermTag)>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::new();
        for (term, tag) in rows {
            let term = normalize_term(term.as_ref());
            if term.is_empty() {
                continue;
            }
            let (own, other) = match tag {
                TermTag::Approved => (&mut lexicon.approved, &lexicon.rejected),
                TermTag::Rejected => (&mut lexicon.rejected, &lexicon.approved),
            };
            if other.contains(&term) {
                return Err(LexiconError::Conflict { term });
            }
            own.insert(term);
        }
        Ok(lexicon)
    }

    /// Tag a term, moving it out of the opposite set if needed.
    pub fn tag(&mut self, term: &str, tag: TermTag) {
        let term = normalize_term(term);
        if term.is_empty() {
            return;
        }
        match tag {
            TermTag::Approved => {
                self.rejected.remove(&term);
                self.approved.insert(term);
            }
            TermTag::Rejected => {
                self.approved.remove(&term);
                self.rejected.insert(term);
            }
        }
    }

    /// Remove a term from whichever set holds it.
    pub fn untag(&mut self, term: &str) -> Option<TermTag> {
        let term = normalize_term(term);
        if self.approved.remove(&term) {
            Some(TermTag::Approved)
        } else if self.rejected.remove(&term) {
            Some(TermTag::Rejected)
        } else {
            None
        }
    }

    pub fn tag_of(&self, term: &str) -> Option<TermTag> {
        let term = normalize_term(term);
        if self.approved.contains(&term) {
            Some(TermTag::Approved)
        } else if self.rejected.contains(&term) {
            Some(TermTag::Rejected)
        } else {
            None
        }
    }

    pub fn approved(&self) -> &BTreeSet<String> {
        &self.approved
    }

    pub fn rejected(&self) -> &BTreeSet<String> {
        &self.rejected
    }

    /// All tagged terms, approved first, each set in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, TermTag)> {
        self.approved
            .iter()
            .map(|t| (t.as_str(), TermTag::Approved))
            .chain(self.rejected.iter().map(|t| (t.as_str(), TermTag::Rejected)))
    }

    pub fn len(&self) -> usize {
        self.approved.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Classification label of a product description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationLabel {
    Approved,
    Rejected,
    #[default]
    Undetermined,
}

impl ClassificationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Undetermined => "undetermined",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one product description.
///
/// `label == Rejected` exactly when `matched_rejected_positive` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: ClassificationLabel,

    /// The term that decided the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Approved terms hit by the text's lemmas, in text order
    #[serde(default)]
    pub matched_approved: Vec<String>,

    /// Rejected terms with at least one non-negated occurrence
    #[serde(default)]
    pub matched_rejected_positive: Vec<String>,

    /// Rejected terms that only occur inside negation spans
    #[serde(default)]
    pub matched_rejected_negated: Vec<String>,

    /// `term:RULE` entries for every negated occurrence
    #[serde(default)]
    pub negation_triggers: Vec<String>,

    /// Script-normalized prefix of the input, for audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_preview: Option<String>,
}

impl ClassificationResult {
    /// Result for a missing description.
    pub fn undetermined() -> Self {
        Self::default()
    }

    pub fn is_rejected(&self) -> bool {
        self.label == ClassificationLabel::Rejected
    }
}

/// Lowercase alias to canonical lowercase brand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandAliasIndex {
    aliases: BTreeMap<String, String>,
}

impl BrandAliasIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from `(brand, comma-separated aliases)` rows.
    ///
    /// Rows missing either cell are dropped. A later row wins when two rows
    /// claim the same alias.
    pub fn from_rows<I, B, A>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<B>, Option<A>)>,
        B: AsRef<str>,
        A: AsRef<str>,
    {
        let mut index = Self::new();
        for (brand, aliases) in rows {
            let (Some(brand), Some(aliases)) = (brand, aliases) else {
                continue;
            };
            let brand = brand.as_ref().trim().to_lowercase();
            if brand.is_empty() {
                continue;
            }
            for alias in aliases.as_ref().split(',') {
                index.insert(alias, &brand);
            }
        }
        index
    }

    pub fn insert(&mut self, alias: &str, brand: &str) {
        let alias = alias.trim().to_lowercase();
        let brand = brand.trim().to_lowercase();
        if alias.is_empty() || brand.is_empty() {
            return;
        }
        self.aliases.insert(alias, brand);
    }

    /// `(alias, brand)` pairs in alias order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn brands(&self) -> BTreeSet<&str> {
        self.aliases.values().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Brand label assigned to a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BrandLabel {
    Brand(String),
    Mixed,
    Undetermined,
}

impl BrandLabel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Brand(b) => b,
            Self::Mixed => "mixed",
            Self::Undetermined => "undetermined",
        }
    }
}

impl From<String> for BrandLabel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "mixed" => Self::Mixed,
            "undetermined" | "" => Self::Undetermined,
            _ => Self::Brand(s),
        }
    }
}

impl From<BrandLabel> for String {
    fn from(label: BrandLabel) -> Self {
        match label {
            BrandLabel::Brand(b) => b,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for BrandLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Brand assignment for one record.
///
/// `brand` is `Mixed` exactly when more than one candidate was collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandAssignment {
    pub brand: BrandLabel,
    pub candidates: BTreeSet<String>,
    /// Fields that contributed a match, in first-contribution order
    pub evidence_fields: Vec<String>,
}

impl BrandAssignment {
    pub fn undetermined() -> Self {
        Self {
            brand: BrandLabel::Undetermined,
            candidates: BTreeSet::new(),
            evidence_fields: Vec::new(),
        }
    }

    /// Derive the label from the candidate set.
    pub fn from_candidates(candidates: BTreeSet<String>, evidence_fields: Vec<String>) -> Self {
        let brand = match candidates.len() {
            0 => BrandLabel::Undetermined,
            1 => candidates
                .iter()
                .next()
                .map(|b| BrandLabel::Brand(b.clone()))
                .unwrap_or(BrandLabel::Undetermined),
            _ => BrandLabel::Mixed,
        };
        Self {
            brand,
            candidates,
            evidence_fields,
        }
    }

    pub fn is_mixed(&self) -> bool {
        self.brand == BrandLabel::Mixed
    }

    pub fn is_determined(&self) -> bool {
        self.brand != BrandLabel::Undetermined
    }
}

impl Default for BrandAssignment {
    fn default() -> Self {
        Self::undetermined()
    }
}

/// Technical attributes parsed from a product description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedAttributes {
    /// Nominal diameter (DN), digits only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_diameter: Option<String>,

    /// Nominal pressure (PN), digits only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_pressure: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_subtype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seal_type: Option<String>,
}

impl ExtractedAttributes {
    pub fn is_empty(&self) -> bool {
        self.nominal_diameter.is_none()
            && self.nominal_pressure.is_none()
            && self.material.is_none()
            && self.product_subtype.is_none()
            && self.seal_type.is_none()
    }
}

/// Normalized name of one party field (exporter, importer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyName {
    pub field: String,
    /// Raw value before normalization
    #[serde(default)]
    pub original: Option<String>,
    pub normalized: NormalizedCompany,
}

/// Whether a record should reach the datamart, and why not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relevance {
    pub is_relevant: bool,
    /// Failed conditions, empty when relevant
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl Default for Relevance {
    fn default() -> Self {
        Self {
            is_relevant: true,
            reasons: Vec::new(),
        }
    }
}

/// Everything derived from one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub parties: Vec<PartyName>,
    pub classification: ClassificationResult,
    pub brand: BrandAssignment,
    pub attributes: ExtractedAttributes,
    pub relevance: Relevance,
}
