/// Characters dropped before the text reaches the speech synthesizer.
const MARKUP_CHARS: [char; 4] = ['*', '#', '_', '`'];

/// Strip markdown emphasis and heading markers and collapse whitespace.
///
/// Models are told to answer in plain text but still emit `**bold**` now and
/// then, which a synthesizer reads aloud literally.
pub fn clean_text_for_speech(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
