use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::TextFragment;

/// Sentinel for an attribute that no fragment provided.
pub const NOT_AVAILABLE: &str = "N/A";

/// Number followed by a strength unit: "75 mg", "5ml", "200 mcg".
static STRENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(mg|ml|mcg|g)").expect("valid regex"));

/// Number followed by a count unit, English or Vietnamese ("viên").
static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(capsules|tablets|pills|viên|vien)").expect("valid regex")
});

/// Expiry label (EXP, HSD = hạn sử dụng, Expiry) then a digits/digits date.
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(EXP|HSD|Expiry)[\s:]*(\d+/\d+)").expect("valid regex"));

/// Structured attributes read off the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelAttributes {
    pub strength: String,
    pub quantity: String,
    pub expiry: String,
}

impl Default for LabelAttributes {
    fn default() -> Self {
        Self {
            strength: NOT_AVAILABLE.to_string(),
            quantity: NOT_AVAILABLE.to_string(),
            expiry: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Last-match-wins rule: every new observation overwrites the previous one.
///
/// Duplicate or partial OCR fragments are expected; downstream prompts get
/// the value observed last in fragment order.
#[derive(Debug, Default)]
struct LastMatchWins {
    value: Option<String>,
}

impl LastMatchWins {
    fn observe(&mut self, pattern: &Regex, text: &str) {
        if let Some(m) = pattern.find(text) {
            self.value = Some(m.as_str().to_string());
        }
    }

    fn into_value(self) -> String {
        self.value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

/// Extract strength, quantity and expiry from a fragment sequence.
///
/// Within a fragment the left-most match of each pattern counts; across
/// fragments the last fragment with a match wins.
pub fn extract_attributes(fragments: &[TextFragment]) -> LabelAttributes {
    let mut strength = LastMatchWins::default();
    let mut quantity = LastMatchWins::default();
    let mut expiry = LastMatchWins::default();

    for fragment in fragments {
        strength.observe(&STRENGTH_RE, &fragment.text);
        quantity.observe(&QUANTITY_RE, &fragment.text);
        expiry.observe(&EXPIRY_RE, &fragment.text);
    }

    LabelAttributes {
        strength: strength.into_value(),
        quantity: quantity.into_value(),
        expiry: expiry.into_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(texts: &[&str]) -> Vec<TextFragment> {
        texts.iter().map(|t| TextFragment::new(*t)).collect()
    }

    #[test]
    fn no_fragments_yield_sentinels() {
        assert_eq!(extract_attributes(&[]), LabelAttributes::default());
    }

    #[test]
    fn last_strength_wins() {
        let attrs = extract_attributes(&fragments(&["100 mg tablet", "50 mg tablet"]));
        assert_eq!(attrs.strength, "50 mg");
    }

    #[test]
    fn later_fragment_without_match_keeps_earlier_value() {
        let attrs = extract_attributes(&fragments(&["75 mg", "Bexarotene"]));
        assert_eq!(attrs.strength, "75 mg");
    }

    #[test]
    fn strength_units() {
        assert_eq!(extract_attributes(&fragments(&["Syrup 5ml"])).strength, "5ml");
        assert_eq!(extract_attributes(&fragments(&["200 MCG"])).strength, "200 MCG");
        assert_eq!(extract_attributes(&fragments(&["1 g sachet"])).strength, "1 g");
    }

    #[test]
    fn first_match_within_one_fragment() {
        let attrs = extract_attributes(&fragments(&["500 mg / 125 mg"]));
        assert_eq!(attrs.strength, "500 mg");
    }

    #[test]
    fn quantity_english_and_vietnamese() {
        assert_eq!(extract_attributes(&fragments(&["30 Tablets"])).quantity, "30 Tablets");
        assert_eq!(extract_attributes(&fragments(&["Hộp 10 viên"])).quantity, "10 viên");
        assert_eq!(extract_attributes(&fragments(&["20vien"])).quantity, "20vien");
        // Singular "tablet" is not a count unit.
        assert_eq!(extract_attributes(&fragments(&["1 tablet"])).quantity, NOT_AVAILABLE);
    }

    #[test]
    fn expiry_labels() {
        assert_eq!(extract_attributes(&fragments(&["EXP: 12/2026"])).expiry, "EXP: 12/2026");
        assert_eq!(extract_attributes(&fragments(&["HSD 03/27"])).expiry, "HSD 03/27");
        assert_eq!(extract_attributes(&fragments(&["Expiry:05/25"])).expiry, "Expiry:05/25");
        assert_eq!(extract_attributes(&fragments(&["LOT 12/34"])).expiry, NOT_AVAILABLE);
    }

    #[test]
    fn extraction_is_deterministic() {
        let input = fragments(&["Bexarotene 75 mg", "100 capsules", "EXP 01/27"]);
        assert_eq!(extract_attributes(&input), extract_attributes(&input));
    }
}
