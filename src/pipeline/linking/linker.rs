use super::database::DrugDatabase;
use super::similarity::similarity_ratio;
use crate::models::{DrugRecord, TextFragment};

/// Score assigned when a brand name appears verbatim inside a fragment.
pub const SUBSTRING_MATCH_SCORE: f64 = 0.95;

/// A link is only trusted when its score is strictly above this.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.4;

/// Whether a linking score is high enough to treat the record as identified.
pub fn is_accepted(score: f64) -> bool {
    score > ACCEPTANCE_THRESHOLD
}

/// Outcome of linking a fragment sequence against the database.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkMatch<'a> {
    pub record: Option<&'a DrugRecord>,
    pub score: f64,
}

impl<'a> LinkMatch<'a> {
    /// The record, but only when the score clears the acceptance threshold.
    pub fn accepted(&self) -> Option<&'a DrugRecord> {
        self.record.filter(|_| is_accepted(self.score))
    }
}

/// Global-maximum rule: one running best pair across every fragment and
/// record. A candidate replaces the current best only when strictly
/// better, so on ties the first pair in scan order is kept.
#[derive(Debug, Clone, Copy)]
struct GlobalBest<'a> {
    record: Option<&'a DrugRecord>,
    score: f64,
}

impl<'a> GlobalBest<'a> {
    fn new() -> Self {
        Self { record: None, score: 0.0 }
    }

    fn offer(&mut self, record: &'a DrugRecord, score: f64) {
        if score > self.score {
            self.score = score;
            self.record = Some(record);
        }
    }

    fn finish(self) -> LinkMatch<'a> {
        LinkMatch {
            record: self.record,
            score: self.score,
        }
    }
}

/// Score one fragment against one record's brand name.
///
/// A case-insensitive literal occurrence of the brand name overrides the
/// similarity ratio with `SUBSTRING_MATCH_SCORE`.
pub fn score_fragment(brand_name: &str, fragment: &str) -> f64 {
    let brand = brand_name.to_lowercase();
    let text = fragment.to_lowercase();
    if text.contains(&brand) {
        return SUBSTRING_MATCH_SCORE;
    }
    similarity_ratio(&brand, &text)
}

/// Find the best-matching record for a fragment sequence.
///
/// Every fragment is scored against every record; the single highest score
/// over the whole scan wins. The result is fully deterministic.
pub fn link_entity<'a>(fragments: &[TextFragment], database: &'a DrugDatabase) -> LinkMatch<'a> {
    let mut best = GlobalBest::new();

    for fragment in fragments {
        for record in database.records() {
            best.offer(record, score_fragment(&record.brand_name, &fragment.text));
        }
    }

    best.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> DrugDatabase {
        DrugDatabase::from_records(vec![
            DrugRecord::new("Advil", "Ibuprofen", "NSAID"),
            DrugRecord::new("Bexarotene", "Bexarotene", "Retinoid"),
            DrugRecord::new("Tylenol", "Acetaminophen", "Analgesic"),
        ])
    }

    #[test]
    fn substring_match_scores_fixed_value() {
        assert_eq!(score_fragment("Bexarotene", "BEXAROTENE 75 mg"), SUBSTRING_MATCH_SCORE);
    }

    #[test]
    fn exact_fragment_is_still_capped_by_substring_rule() {
        assert_eq!(score_fragment("Advil", "advil"), SUBSTRING_MATCH_SCORE);
    }

    #[test]
    fn best_match_is_global_across_fragments() {
        let db = db();
        // First fragment is a partial match for Advil, second contains Bexarotene.
        let fragments = vec![TextFragment::new("Advl"), TextFragment::new("Bexarotene 75 mg")];
        let link = link_entity(&fragments, &db);
        assert_eq!(link.record.unwrap().brand_name, "Bexarotene");
        assert_eq!(link.score, SUBSTRING_MATCH_SCORE);
    }

    #[test]
    fn later_weaker_fragment_does_not_reset_best() {
        let db = db();
        let fragments = vec![TextFragment::new("Tylenol extra"), TextFragment::new("Advl")];
        let link = link_entity(&fragments, &db);
        assert_eq!(link.record.unwrap().brand_name, "Tylenol");
        assert_eq!(link.score, SUBSTRING_MATCH_SCORE);
    }

    #[test]
    fn ties_keep_first_record_in_scan_order() {
        let db = DrugDatabase::from_records(vec![
            DrugRecord::new("Zinc", "zinc", "Mineral"),
            DrugRecord::new("Zinc", "zinc gluconate", "Mineral"),
        ]);
        let link = link_entity(&[TextFragment::new("zinc 50 mg")], &db);
        assert_eq!(link.record.unwrap().generic_name, "zinc");
    }

    #[test]
    fn empty_inputs_yield_no_match() {
        let db = db();
        let link = link_entity(&[], &db);
        assert!(link.record.is_none());
        assert_eq!(link.score, 0.0);

        let empty = DrugDatabase::empty();
        let link = link_entity(&[TextFragment::new("Advil")], &empty);
        assert!(link.record.is_none());
        assert!(link.accepted().is_none());
    }

    #[test]
    fn acceptance_boundary_is_strict() {
        assert!(!is_accepted(0.4));
        assert!(is_accepted(0.41));
        assert!(!is_accepted(0.0));
    }

    #[test]
    fn weak_link_is_not_accepted() {
        let db = db();
        let link = link_entity(&[TextFragment::new("qqqqqqqq xz")], &db);
        assert!(link.score <= ACCEPTANCE_THRESHOLD);
        assert!(link.accepted().is_none());
    }

    #[test]
    fn linking_is_deterministic() {
        let db = db();
        let fragments = vec![TextFragment::new("Tylenl"), TextFragment::new("Advi 200")];
        let first = link_entity(&fragments, &db);
        let second = link_entity(&fragments, &db);
        assert_eq!(first, second);
    }
}
