//! Explanation generation for processed declaration records.
//!
//! Converts a record outcome into human-readable explanations suitable for
//! review of the datamart and for the CLI's text output.

use serde::{Deserialize, Serialize};
use tradeflow_model::{
    BrandAssignment, BrandLabel, ClassificationLabel, ClassificationResult, PartyName,
    RecordOutcome, Relevance,
};

/// A structured explanation for one aspect of a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation (1-2 sentences)
    pub detail: String,

    /// How much this needs a reviewer's attention (0.0 - 1.0)
    pub severity: f32,

    /// Evidence items supporting this explanation
    pub evidence: Vec<EvidenceItem>,
}

/// A piece of evidence supporting an explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Type of evidence
    pub kind: String,

    /// The specific value or match
    pub value: String,

    /// Optional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl EvidenceItem {
    fn new(kind: &str, value: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.into(),
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Generate explanations for every aspect of a record outcome.
pub fn explain_outcome(outcome: &RecordOutcome) -> Vec<Explanation> {
    let mut explanations = vec![explain_classification(&outcome.classification)];
    if let Some(negations) = explain_negations(&outcome.classification) {
        explanations.push(negations);
    }
    explanations.push(explain_brand(&outcome.brand));
    explanations.extend(outcome.parties.iter().filter_map(explain_party));
    if let Some(relevance) = explain_relevance(&outcome.relevance) {
        explanations.push(relevance);
    }
    explanations
}

/// Explain the classification label.
pub fn explain_classification(result: &ClassificationResult) -> Explanation {
    let reason = result.reason.clone().unwrap_or_default();
    match result.label {
        ClassificationLabel::Rejected => Explanation {
            summary: format!("Rejected term '{}'", reason),
            detail: format!(
                "The description mentions '{}' outside any negation, \
                 so the product is outside the target category.",
                reason
            ),
            severity: 1.0,
            evidence: result
                .matched_rejected_positive
                .iter()
                .map(|t| EvidenceItem::new("rejected_term", t.as_str()))
                .collect(),
        },

        ClassificationLabel::Approved => Explanation {
            summary: format!("Approved term '{}'", reason),
            detail: format!(
                "The description contains the approved term '{}' and no rejected term.",
                reason
            ),
            severity: 0.0,
            evidence: result
                .matched_approved
                .iter()
                .map(|t| EvidenceItem::new("approved_term", t.as_str()))
                .collect(),
        },

        ClassificationLabel::Undetermined => Explanation {
            summary: "No lexicon term found".to_string(),
            detail: "Neither approved nor rejected terms occur in the description. \
                     Tagging more vocabulary may resolve it."
                .to_string(),
            severity: 0.3,
            evidence: result
                .text_preview
                .iter()
                .map(|p| EvidenceItem::new("text", p.as_str()))
                .collect(),
        },
    }
}

/// Explain rejected terms that were discounted because they were negated.
pub fn explain_negations(result: &ClassificationResult) -> Option<Explanation> {
    if result.negation_triggers.is_empty() {
        return None;
    }
    Some(Explanation {
        summary: format!("{} negated mention(s)", result.negation_triggers.len()),
        detail: format!(
            "Rejected terms appear in negated context ({}) and were not counted.",
            result.matched_rejected_negated.join(", ")
        ),
        severity: 0.2,
        evidence: result
            .negation_triggers
            .iter()
            .map(|trigger| match trigger.split_once(':') {
                Some((term, rule)) => EvidenceItem::new("negation", term).with_context(rule),
                None => EvidenceItem::new("negation", trigger.as_str()),
            })
            .collect(),
    })
}

/// Explain the brand assignment.
pub fn explain_brand(brand: &BrandAssignment) -> Explanation {
    let evidence = brand
        .evidence_fields
        .iter()
        .map(|f| EvidenceItem::new("brand_field", f.as_str()))
        .chain(
            brand
                .candidates
                .iter()
                .map(|c| EvidenceItem::new("brand_candidate", c.as_str())),
        )
        .collect();

    match &brand.brand {
        BrandLabel::Brand(name) => Explanation {
            summary: format!("Brand '{}'", name),
            detail: format!(
                "An alias of '{}' was found in {}.",
                name,
                brand.evidence_fields.join(", ")
            ),
            severity: 0.0,
            evidence,
        },
        BrandLabel::Mixed => Explanation {
            summary: format!("{} brands", brand.candidates.len()),
            detail: "Aliases of several brands were found; the record needs manual attribution."
                .to_string(),
            severity: 0.5,
            evidence,
        },
        BrandLabel::Undetermined => Explanation {
            summary: "Brand not determined".to_string(),
            detail: "No alias from the brand dictionary matched exactly or fuzzily.".to_string(),
            severity: 0.3,
            evidence,
        },
    }
}

/// Explain a stripped legal form; `None` when the party had none.
pub fn explain_party(party: &PartyName) -> Option<Explanation> {
    let form = party.normalized.legal_form.as_deref()?;
    let name = party.normalized.name.as_deref().unwrap_or_default();
    let mut item = EvidenceItem::new("legal_form", form);
    if let Some(original) = &party.original {
        item = item.with_context(original.as_str());
    }
    Some(Explanation {
        summary: format!("{}: {} {}", party.field, form, name),
        detail: format!("Legal form '{}' was separated from the name in {}.", form, party.field),
        severity: 0.0,
        evidence: vec![item],
    })
}

/// Explain why a record was excluded; `None` when it is relevant.
pub fn explain_relevance(relevance: &Relevance) -> Option<Explanation> {
    if relevance.is_relevant {
        return None;
    }
    Some(Explanation {
        summary: "Excluded from datamart".to_string(),
        detail: format!("Failed conditions: {}.", relevance.reasons.join(", ")),
        severity: 1.0,
        evidence: relevance
            .reasons
            .iter()
            .map(|r| EvidenceItem::new("relevance", r.as_str()))
            .collect(),
    })
}

/// One-line summary of a record outcome.
pub fn summarize_outcome(outcome: &RecordOutcome) -> String {
    let label = outcome.classification.label.as_str().to_uppercase();
    let classification = match &outcome.classification.reason {
        Some(reason) => format!("{} ({})", label, reason),
        None => label,
    };
    let relevance = if outcome.relevance.is_relevant {
        "relevant".to_string()
    } else {
        format!("excluded: {}", outcome.relevance.reasons.join(", "))
    };
    format!(
        "{}; brand {}; {}",
        classification,
        outcome.brand.brand,
        relevance
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tradeflow_model::NormalizedCompany;

    fn rejected() -> ClassificationResult {
        ClassificationResult {
            label: ClassificationLabel::Rejected,
            reason: Some("клапан".to_string()),
            matched_rejected_positive: vec!["клапан".to_string()],
            matched_rejected_negated: vec!["сильфон".to_string()],
            negation_triggers: vec!["сильфон:NEG_4".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_explain_rejected() {
        let explanation = explain_classification(&rejected());
        assert_eq!(explanation.severity, 1.0);
        assert!(explanation.summary.contains("клапан"));
        assert_eq!(explanation.evidence.len(), 1);
    }

    #[test]
    fn test_negation_evidence_splits_rule() {
        let explanation = explain_negations(&rejected()).unwrap();
        assert_eq!(explanation.evidence[0].value, "сильфон");
        assert_eq!(explanation.evidence[0].context.as_deref(), Some("NEG_4"));
        assert!(explain_negations(&ClassificationResult::undetermined()).is_none());
    }

    #[test]
    fn test_explain_outcome_sections() {
        let outcome = RecordOutcome {
            parties: vec![
                PartyName {
                    field: "exporter_name".to_string(),
                    original: Some("ООО \"Ромашка\"".to_string()),
                    normalized: NormalizedCompany {
                        legal_form: Some("ООО".to_string()),
                        name: Some("ромашка".to_string()),
                    },
                },
                PartyName {
                    field: "importer_name".to_string(),
                    original: None,
                    normalized: NormalizedCompany::missing(),
                },
            ],
            classification: rejected(),
            relevance: Relevance {
                is_relevant: false,
                reasons: vec!["rejected".to_string()],
            },
            ..Default::default()
        };
        let summaries: Vec<_> = explain_outcome(&outcome)
            .into_iter()
            .map(|e| e.summary)
            .collect();
        assert_eq!(
            summaries,
            vec![
                "Rejected term 'клапан'",
                "1 negated mention(s)",
                "Brand not determined",
                "exporter_name: ООО ромашка",
                "Excluded from datamart",
            ]
        );
    }

    #[test]
    fn test_summary_line() {
        let outcome = RecordOutcome {
            classification: rejected(),
            relevance: Relevance {
                is_relevant: false,
                reasons: vec!["rejected".to_string(), "is_bad_importer".to_string()],
            },
            ..Default::default()
        };
        assert_eq!(
            summarize_outcome(&outcome),
            "REJECTED (клапан); brand undetermined; excluded: rejected, is_bad_importer"
        );
    }
}
