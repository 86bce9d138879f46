use super::endpoint::ModelEndpoint;
use super::prompt::{build_generator_prompt, AdviceLanguage};
use super::types::GenerationOptions;

/// Low temperature keeps the draft close to the grounding text.
pub const GENERATOR_TEMPERATURE: f32 = 0.4;

/// Draft plain-language advice about the scanned product ("doctor" role).
///
/// Returns `None` when the model call fails after retries or yields only
/// whitespace.
pub fn generate_draft_advice(
    endpoint: &ModelEndpoint,
    context: &str,
    grounding: Option<&str>,
    language: AdviceLanguage,
) -> Option<String> {
    let prompt = build_generator_prompt(context, grounding, language);

    let Some(raw) = endpoint.call("generator", &prompt, GenerationOptions::text(GENERATOR_TEMPERATURE))
    else {
        tracing::error!("Generator failed after retries");
        return None;
    };

    let draft = raw.trim();
    if draft.is_empty() {
        tracing::error!("Generator returned an empty draft");
        return None;
    }

    tracing::debug!(draft_len = draft.len(), "Draft advice generated");
    Some(draft.to_string())
}
