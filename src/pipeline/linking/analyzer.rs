use serde::{Deserialize, Serialize};

use super::attributes::extract_attributes;
use super::database::DrugDatabase;
use super::fragment::usable_fragments;
use super::linker::link_entity;
use crate::models::{DrugRecord, TextFragment};

/// Suggestion reported when no record clears the acceptance threshold.
pub const UNKNOWN_SUGGESTION: &str = "Unknown";

/// Provenance line appended to every grounding block.
pub const GROUNDING_PROVENANCE: &str = "FDA USA";

/// Structured result of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub final_suggestion: String,
    /// Highest linking score seen during the scan, in `[0, 1]`.
    pub score: f64,
    pub strength: String,
    pub quantity: String,
    pub expiry: String,
    /// Grounding text for the advice pipeline; `None` when unidentified.
    pub fda_record: Option<String>,
}

impl AnalysisResult {
    pub fn is_identified(&self) -> bool {
        self.fda_record.is_some()
    }
}

/// Link the fragments to a record and read the label attributes.
pub fn analyze_metadata(fragments: &[TextFragment], database: &DrugDatabase) -> AnalysisResult {
    let fragments = usable_fragments(fragments);
    let link = link_entity(&fragments, database);
    let attributes = extract_attributes(&fragments);

    let accepted = link.accepted();
    match link.record {
        Some(record) if accepted.is_some() => tracing::info!(
            candidate = %record.brand_name,
            score = link.score,
            "Entity linked"
        ),
        Some(record) => tracing::info!(
            candidate = %record.brand_name,
            score = link.score,
            "Best candidate below acceptance threshold"
        ),
        None => tracing::info!(fragments = fragments.len(), "No entity candidate"),
    }
    tracing::debug!(
        strength = %attributes.strength,
        quantity = %attributes.quantity,
        expiry = %attributes.expiry,
        "Label attributes extracted"
    );

    AnalysisResult {
        final_suggestion: accepted
            .map(|r| r.brand_name.clone())
            .unwrap_or_else(|| UNKNOWN_SUGGESTION.to_string()),
        score: link.score,
        strength: attributes.strength,
        quantity: attributes.quantity,
        expiry: attributes.expiry,
        fda_record: accepted.map(format_grounding),
    }
}

/// Render the factual description of a record handed to the language model.
pub fn format_grounding(record: &DrugRecord) -> String {
    let mut lines = vec![
        format!("Brand Name: {}", record.brand_name),
        format!("Active Ingredient: {}", record.generic_name),
        format!("Pharmacological Class: {}", record.pharm_class),
    ];
    if let Some(form) = &record.dosage_form {
        lines.push(format!("Dosage Form: {form}"));
    }
    if let Some(route) = &record.route {
        lines.push(format!("Route: {route}"));
    }
    lines.push(format!("Data Source: {GROUNDING_PROVENANCE}"));
    lines.join("\n")
}

/// One-line description of the scan used as the user query for advice.
///
/// `confirmed_name` is the name a person confirmed or typed in; when absent
/// the linked suggestion is used.
pub fn build_advice_context(result: &AnalysisResult, confirmed_name: Option<&str>) -> String {
    let name = confirmed_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(result.final_suggestion.as_str());
    format!(
        "Drug: {name}, Dosage: {}, Qty: {}, Exp: {}",
        result.strength, result.quantity, result.expiry
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::linking::attributes::NOT_AVAILABLE;
    use crate::pipeline::linking::linker::SUBSTRING_MATCH_SCORE;

    fn bexarotene_db() -> DrugDatabase {
        DrugDatabase::from_records(vec![DrugRecord::new("Bexarotene", "Bexarotene", "Retinoid")])
    }

    #[test]
    fn identifies_bexarotene_label() {
        let result = analyze_metadata(&[TextFragment::new("Bexarotene 75 mg")], &bexarotene_db());

        assert_eq!(result.final_suggestion, "Bexarotene");
        assert_eq!(result.score, SUBSTRING_MATCH_SCORE);
        assert_eq!(result.strength, "75 mg");
        assert_eq!(result.quantity, NOT_AVAILABLE);
        assert_eq!(result.expiry, NOT_AVAILABLE);
        let grounding = result.fda_record.unwrap();
        assert!(grounding.contains("Brand Name: Bexarotene"));
        assert!(grounding.contains("Pharmacological Class: Retinoid"));
        assert!(grounding.ends_with("Data Source: FDA USA"));
    }

    #[test]
    fn empty_scan_is_unknown() {
        let result = analyze_metadata(&[], &bexarotene_db());

        assert_eq!(result.final_suggestion, UNKNOWN_SUGGESTION);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.strength, NOT_AVAILABLE);
        assert_eq!(result.quantity, NOT_AVAILABLE);
        assert_eq!(result.expiry, NOT_AVAILABLE);
        assert!(result.fda_record.is_none());
        assert!(!result.is_identified());
    }

    #[test]
    fn weak_candidate_reports_unknown_but_keeps_score() {
        let result = analyze_metadata(&[TextFragment::new("Bx 10 tablets")], &bexarotene_db());

        assert_eq!(result.final_suggestion, UNKNOWN_SUGGESTION);
        assert!(result.score > 0.0 && result.score <= 0.4, "score {}", result.score);
        assert!(result.fda_record.is_none());
        assert_eq!(result.quantity, "10 tablets");
    }

    #[test]
    fn empty_database_never_matches() {
        let result = analyze_metadata(&[TextFragment::new("Bexarotene")], &DrugDatabase::empty());
        assert_eq!(result.final_suggestion, UNKNOWN_SUGGESTION);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn short_fragments_are_ignored() {
        let db = DrugDatabase::from_records(vec![DrugRecord::new("Ab", "ab", "Test")]);
        let result = analyze_metadata(&[TextFragment::new("Ab")], &db);
        assert_eq!(result.final_suggestion, UNKNOWN_SUGGESTION);
    }

    #[test]
    fn grounding_includes_form_and_route_when_known() {
        let record = DrugRecord::new("Advil", "Ibuprofen", "NSAID")
            .with_dosage_form("TABLET")
            .with_route("ORAL");
        let text = format_grounding(&record);
        assert!(text.contains("Dosage Form: TABLET"));
        assert!(text.contains("Route: ORAL"));
    }

    #[test]
    fn advice_context_prefers_confirmed_name() {
        let result = analyze_metadata(&[TextFragment::new("Bexarotene 75 mg")], &bexarotene_db());
        assert_eq!(
            build_advice_context(&result, None),
            "Drug: Bexarotene, Dosage: 75 mg, Qty: N/A, Exp: N/A"
        );
        assert_eq!(
            build_advice_context(&result, Some("Targretin")),
            "Drug: Targretin, Dosage: 75 mg, Qty: N/A, Exp: N/A"
        );
        assert!(build_advice_context(&result, Some("  ")).starts_with("Drug: Bexarotene"));
    }
}
