use crate::models::TextFragment;

/// Fragments shorter than this (in characters, after trimming) are OCR noise.
pub const MIN_FRAGMENT_CHARS: usize = 3;

/// Trim fragments and drop the ones too short to carry a drug name or attribute.
///
/// Order is preserved; the linker and extractor depend on it.
pub fn usable_fragments(fragments: &[TextFragment]) -> Vec<TextFragment> {
    fragments
        .iter()
        .map(|f| f.text.trim())
        .filter(|text| text.chars().count() >= MIN_FRAGMENT_CHARS)
        .map(TextFragment::new)
        .collect()
}
