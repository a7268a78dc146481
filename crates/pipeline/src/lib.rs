//! Per-record processing of customs declarations.
//!
//! `RecordProcessor` bundles the read-only matchers built once per run and
//! turns each record into a `RecordOutcome`, which is then merged back into
//! the record as flat output columns.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tradeflow_attributes::{AttributeExtractor, AttributeTables};
use tradeflow_brand::{BrandError, BrandMatcher, BrandMatcherConfig};
use tradeflow_classify::{ClassifierConfig, Classifier, ClassifyError};
use tradeflow_company::{CompanyConfig, CompanyNormalizer};
use tradeflow_features::{Lemmatizer, PatternError};
use tradeflow_model::{
    fields, BrandAliasIndex, BrandAssignment, ClassificationLabel, ClassificationResult,
    ExtractedAttributes, PartyName, RecordOutcome, Relevance, TermLexicon, TradeRecord,
};

/// Output column names written by [`RecordProcessor::apply`].
pub mod columns {
    pub const CLASSIFICATION: &str = "classification";
    pub const REASON: &str = "reason";
    pub const MATCHED_APPROVED: &str = "matched_approved";
    pub const MATCHED_REJECTED: &str = "matched_rejected";
    pub const MATCHED_REJECTED_NEGATED: &str = "matched_rejected_negated";
    pub const NEGATION_TRIGGERS: &str = "negation_triggers";
    pub const TEXT_NORM_PREVIEW: &str = "text_norm_preview";
    pub const BRAND_EXTRACTED: &str = "brand_extracted";
    pub const BRAND_CANDIDATES: &str = "brand_candidates";
    pub const BRAND_MIXED: &str = "brand_mixed";
    pub const BRAND_COLUMN_REASON: &str = "brand_column_reason";
    pub const ATTRIBUTE_DN: &str = "attribute_dn";
    pub const ATTRIBUTE_PN: &str = "attribute_pn";
    pub const ATTRIBUTE_MATERIAL: &str = "attribute_material";
    pub const ATTRIBUTE_PRODTYPE: &str = "attribute_prodtype";
    pub const ATTRIBUTE_SEALING: &str = "attribute_sealing";
    pub const IS_RELEVANT: &str = "is_relevant";
    pub const IS_RELEVANT_REASON: &str = "is_relevant_reason";
}

/// Upstream flags that exclude a record when true.
const EXCLUDING_FLAGS: &[&str] = &["is_bad_importer", "is_bad_exporter", "is_blacklisted_manual"];
const VALIDITY_FLAG: &str = "is_valid";

const LIST_SEPARATOR: &str = ", ";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("company patterns: {0}")]
    Company(#[source] PatternError),

    #[error("attribute tables: {0}")]
    Attributes(#[source] PatternError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Brand(#[from] BrandError),
}

/// Configuration for a processing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub company: CompanyConfig,
    pub classifier: ClassifierConfig,
    pub brand: BrandMatcherConfig,
    /// Party fields normalized into name plus legal form
    pub party_fields: Vec<String>,
    /// Free-text field classified and parsed for attributes
    pub text_field: String,
    /// Process records on the rayon thread pool
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            company: CompanyConfig::default(),
            classifier: ClassifierConfig::default(),
            brand: BrandMatcherConfig::default(),
            party_fields: vec![
                fields::EXPORTER_NAME.to_string(),
                fields::IMPORTER_NAME.to_string(),
            ],
            text_field: fields::PROD_DETAILS.to_string(),
            parallel: false,
        }
    }
}

/// Read-only matchers for one run.
pub struct RecordProcessor {
    config: PipelineConfig,
    company: CompanyNormalizer,
    classifier: Classifier,
    brand: BrandMatcher,
    attributes: AttributeExtractor,
}

impl RecordProcessor {
    /// Build with the default Snowball lemmatizer.
    pub fn new(
        config: PipelineConfig,
        lexicon: &TermLexicon,
        aliases: &BrandAliasIndex,
        tables: &AttributeTables,
    ) -> Result<Self, PipelineError> {
        Self::with_lemmatizer(config, Lemmatizer::default(), lexicon, aliases, tables)
    }

    pub fn with_lemmatizer(
        config: PipelineConfig,
        lemmatizer: Lemmatizer,
        lexicon: &TermLexicon,
        aliases: &BrandAliasIndex,
        tables: &AttributeTables,
    ) -> Result<Self, PipelineError> {
        let company =
            CompanyNormalizer::new(config.company.clone()).map_err(PipelineError::Company)?;
        let classifier = Classifier::new(lexicon, lemmatizer, config.classifier.clone())?;
        let brand = BrandMatcher::new(aliases, config.brand.clone())?;
        let attributes = AttributeExtractor::new(tables).map_err(PipelineError::Attributes)?;

        Ok(Self {
            config,
            company,
            classifier,
            brand,
            attributes,
        })
    }

    /// Derive every output of one record without modifying it.
    ///
    /// Value-level failures (a nested value where text is expected) are
    /// logged and fall back to the component's empty result.
    pub fn process(&self, record: &TradeRecord) -> RecordOutcome {
        let decl = record.text(fields::DECL_NUMBER).ok().flatten().unwrap_or_default();

        let mut parties = Vec::with_capacity(self.config.party_fields.len());
        for field in &self.config.party_fields {
            match record.text(field) {
                Ok(original) => parties.push(PartyName {
                    field: field.clone(),
                    normalized: self.company.normalize(original.as_deref()),
                    original,
                }),
                Err(error) => tracing::warn!(decl = %decl, %error, "party name skipped"),
            }
        }

        let text = match record.text(&self.config.text_field) {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(decl = %decl, %error, "product text unusable");
                None
            }
        };

        let classification = self.classifier.classify(text.as_deref());
        let brand = self.brand.assign(record).unwrap_or_else(|error| {
            tracing::warn!(decl = %decl, %error, "brand extraction failed");
            BrandAssignment::undetermined()
        });
        let attributes = self.attributes.extract(text.as_deref());
        let relevance = relevance(record, &classification);

        tracing::debug!(
            decl = %decl,
            label = %classification.label,
            brand = %brand.brand,
            relevant = relevance.is_relevant,
            "record processed"
        );

        RecordOutcome {
            parties,
            classification,
            brand,
            attributes,
            relevance,
        }
    }

    /// Merge an outcome back into its record as flat columns.
    pub fn apply(&self, record: &mut TradeRecord, outcome: &RecordOutcome) {
        for party in &outcome.parties {
            record.set(format!("{}_orig", party.field), party.original.clone());
            record.set(format!("{}_opf", party.field), party.normalized.legal_form.clone());
            record.set(party.field.clone(), party.normalized.name.clone());
        }
        apply_classification(record, &outcome.classification);
        apply_brand(record, &outcome.brand);
        apply_attributes(record, &outcome.attributes);
        record.set(columns::IS_RELEVANT, outcome.relevance.is_relevant);
        record.set(
            columns::IS_RELEVANT_REASON,
            outcome.relevance.reasons.join(LIST_SEPARATOR),
        );
    }

    /// Process one record and return it with the output columns merged in.
    pub fn process_record(&self, mut record: TradeRecord) -> (TradeRecord, RecordOutcome) {
        let outcome = self.process(&record);
        self.apply(&mut record, &outcome);
        (record, outcome)
    }

    /// Process a whole batch. Output order matches input order.
    pub fn run(&self, records: Vec<TradeRecord>) -> (Vec<TradeRecord>, BatchSummary) {
        self.run_with(records, |_, _| {})
    }

    /// Like [`RecordProcessor::run`], calling `on_outcome` for every
    /// processed record in input order.
    pub fn run_with<F>(
        &self,
        records: Vec<TradeRecord>,
        mut on_outcome: F,
    ) -> (Vec<TradeRecord>, BatchSummary)
    where
        F: FnMut(&TradeRecord, &RecordOutcome),
    {
        tracing::info!(records = records.len(), parallel = self.config.parallel, "batch started");

        let processed: Vec<(TradeRecord, RecordOutcome)> = if self.config.parallel {
            records
                .into_par_iter()
                .map(|record| self.process_record(record))
                .collect()
        } else {
            records
                .into_iter()
                .map(|record| self.process_record(record))
                .collect()
        };

        let mut summary = BatchSummary::default();
        let mut out = Vec::with_capacity(processed.len());
        for (record, outcome) in processed {
            on_outcome(&record, &outcome);
            summary.add(&outcome);
            out.push(record);
        }

        tracing::info!(
            records = summary.records,
            rejected = summary.rejected,
            relevant = summary.relevant,
            "batch finished"
        );
        (out, summary)
    }
}

fn join(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}

fn apply_classification(record: &mut TradeRecord, result: &ClassificationResult) {
    record.set(columns::CLASSIFICATION, result.label.as_str());
    record.set(columns::REASON, result.reason.clone());
    record.set(columns::MATCHED_APPROVED, join(&result.matched_approved));
    record.set(columns::MATCHED_REJECTED, join(&result.matched_rejected_positive));
    record.set(
        columns::MATCHED_REJECTED_NEGATED,
        join(&result.matched_rejected_negated),
    );
    record.set(columns::NEGATION_TRIGGERS, join(&result.negation_triggers));
    record.set(columns::TEXT_NORM_PREVIEW, result.text_preview.clone());
}

fn apply_brand(record: &mut TradeRecord, brand: &BrandAssignment) {
    let candidates: Vec<String> = brand.candidates.iter().cloned().collect();
    record.set(columns::BRAND_EXTRACTED, brand.brand.to_string());
    record.set(columns::BRAND_CANDIDATES, join(&candidates));
    record.set(columns::BRAND_MIXED, brand.is_mixed());
    record.set(columns::BRAND_COLUMN_REASON, join(&brand.evidence_fields));
}

fn apply_attributes(record: &mut TradeRecord, attributes: &ExtractedAttributes) {
    record.set(columns::ATTRIBUTE_DN, attributes.nominal_diameter.clone());
    record.set(columns::ATTRIBUTE_PN, attributes.nominal_pressure.clone());
    record.set(columns::ATTRIBUTE_MATERIAL, attributes.material.clone());
    record.set(columns::ATTRIBUTE_PRODTYPE, attributes.product_subtype.clone());
    record.set(columns::ATTRIBUTE_SEALING, attributes.seal_type.clone());
}

/// Decide whether a record belongs in the datamart.
///
/// Absent upstream flags do not count against the record.
pub fn relevance(record: &TradeRecord, classification: &ClassificationResult) -> Relevance {
    let mut reasons = Vec::new();
    if record.flag(VALIDITY_FLAG) == Some(false) {
        reasons.push(VALIDITY_FLAG.to_string());
    }
    for flag in EXCLUDING_FLAGS {
        if record.flag(flag) == Some(true) {
            reasons.push(flag.to_string());
        }
    }
    if classification.is_rejected() {
        reasons.push(columns::CLASSIFICATION.to_string());
    }
    Relevance {
        is_relevant: reasons.is_empty(),
        reasons,
    }
}

/// Counts over a processed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub records: usize,
    pub approved: usize,
    pub rejected: usize,
    pub undetermined: usize,
    pub brand_determined: usize,
    pub brand_mixed: usize,
    pub with_attributes: usize,
    pub relevant: usize,
}

impl BatchSummary {
    pub fn add(&mut self, outcome: &RecordOutcome) {
        self.records += 1;
        match outcome.classification.label {
            ClassificationLabel::Approved => self.approved += 1,
            ClassificationLabel::Rejected => self.rejected += 1,
            ClassificationLabel::Undetermined => self.undetermined += 1,
        }
        if outcome.brand.is_determined() {
            self.brand_determined += 1;
        }
        if outcome.brand.is_mixed() {
            self.brand_mixed += 1;
        }
        if !outcome.attributes.is_empty() {
            self.with_attributes += 1;
        }
        if outcome.relevance.is_relevant {
            self.relevant += 1;
        }
    }

    /// Share of records with a determined brand, 0.0 for an empty batch.
    pub fn brand_coverage(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            self.brand_determined as f64 / self.records as f64
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records:       {}", self.records)?;
        writeln!(
            f,
            "Classified:    {} approved, {} rejected, {} undetermined",
            self.approved, self.rejected, self.undetermined
        )?;
        writeln!(
            f,
            "Brands:        {} determined ({:.1}%), {} mixed",
            self.brand_determined,
            self.brand_coverage() * 100.0,
            self.brand_mixed
        )?;
        writeln!(f, "Attributes:    {} records", self.with_attributes)?;
        write!(f, "Relevant:      {}", self.relevant)
    }
}
