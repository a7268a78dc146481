//! Technical attribute extraction from product descriptions.
//!
//! Two kinds of attributes:
//! - Numeric (nominal diameter, nominal pressure): first key synonym followed
//!   by an optional separator and 1-4 digits
//! - Categorical (material, product subtype, seal type): canonical label of the
//!   first synonym contained in the text

pub mod tables;

pub use tables::{AttributeTables, SynonymGroup};

use std::sync::LazyLock;
use tradeflow_features::{OrderedPatterns, PatternError, PatternOrder};
use tradeflow_model::ExtractedAttributes;

/// Extractor with all dictionaries compiled.
#[derive(Debug, Clone)]
pub struct AttributeExtractor {
    diameter: OrderedPatterns<()>,
    pressure: OrderedPatterns<()>,
    material: OrderedPatterns<String>,
    product_subtype: OrderedPatterns<String>,
    seal_type: OrderedPatterns<String>,
}

static DEFAULT_EXTRACTOR: LazyLock<AttributeExtractor> = LazyLock::new(|| {
    AttributeExtractor::new(&AttributeTables::default()).expect("built-in attribute tables compile")
});

/// Extract attributes with the built-in dictionaries.
pub fn extract_attributes(text: Option<&str>) -> ExtractedAttributes {
    DEFAULT_EXTRACTOR.extract(text)
}

/// Key not preceded by a letter, digits not followed by a digit.
fn numeric_table(keys: &[String]) -> Result<OrderedPatterns<()>, PatternError> {
    OrderedPatterns::compile(
        keys.iter().map(|key| {
            (
                format!(
                    r"(?:^|\P{{L}}){}\s*[:\-]?\s*(\d{{1,4}})(?:\D|$)",
                    regex::escape(&key.to_lowercase())
                ),
                (),
            )
        }),
        PatternOrder::Declared,
        false,
    )
}

fn synonym_table(groups: &[SynonymGroup]) -> Result<OrderedPatterns<String>, PatternError> {
    OrderedPatterns::literals(groups.iter().flat_map(|group| {
        group
            .synonyms
            .iter()
            .map(move |synonym| (synonym.as_str(), group.label.clone()))
    }))
}

impl AttributeExtractor {
    pub fn new(tables: &AttributeTables) -> Result<Self, PatternError> {
        Ok(Self {
            diameter: numeric_table(&tables.diameter_keys)?,
            pressure: numeric_table(&tables.pressure_keys)?,
            material: synonym_table(&tables.materials)?,
            product_subtype: synonym_table(&tables.product_subtypes)?,
            seal_type: synonym_table(&tables.seal_types)?,
        })
    }

    /// Extract every attribute from one description. Missing text yields an
    /// empty result.
    pub fn extract(&self, text: Option<&str>) -> ExtractedAttributes {
        let Some(text) = text else {
            return ExtractedAttributes::default();
        };
        let text = text.to_lowercase();

        let number = |table: &OrderedPatterns<()>| {
            table
                .first_match(&text)
                .and_then(|hit| hit.group)
                .map(str::to_string)
        };
        let label = |table: &OrderedPatterns<String>| table.first_match(&text).map(|hit| hit.label.clone());

        ExtractedAttributes {
            nominal_diameter: number(&self.diameter),
            nominal_pressure: number(&self.pressure),
            material: label(&self.material),
            product_subtype: label(&self.product_subtype),
            seal_type: label(&self.seal_type),
        }
    }
}
