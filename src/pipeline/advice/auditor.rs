use serde::{Deserialize, Serialize};

use super::endpoint::ModelEndpoint;
use super::prompt::{build_auditor_prompt, AdviceLanguage};
use super::types::GenerationOptions;

/// Deterministic output for the verification role.
pub const AUDITOR_TEMPERATURE: f32 = 0.0;

pub const REASON_SKIPPED_OVERLOADED: &str = "Audit skipped (model overloaded)";
pub const REASON_PARSE_FAILED: &str = "Audit failed (JSON parse error)";
const REASON_MISSING: &str = "No reason given";

/// Structured result of the safety audit.
///
/// When `is_safe` is false, `corrected_advice` is the preferred replacement;
/// if it is absent the consumer falls back to a refusal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditVerdict {
    pub is_safe: bool,
    pub reason: String,
    pub corrected_advice: Option<String>,
}

impl AuditVerdict {
    /// Fail-safe verdict when the audit call could not be completed.
    pub fn skipped_overloaded() -> Self {
        Self {
            is_safe: true,
            reason: REASON_SKIPPED_OVERLOADED.to_string(),
            corrected_advice: None,
        }
    }

    /// Fail-safe verdict when the model replied with something other than a verdict.
    pub fn parse_failed() -> Self {
        Self {
            is_safe: true,
            reason: REASON_PARSE_FAILED.to_string(),
            corrected_advice: None,
        }
    }

    /// Non-blank correction text, if the auditor offered one.
    pub fn correction(&self) -> Option<&str> {
        self.corrected_advice
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// Wire shape of the model's reply. Only `is_safe` is mandatory.
#[derive(Deserialize)]
struct RawVerdict {
    is_safe: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    corrected_advice: Option<String>,
}

/// Strip a Markdown code fence (```json ... ```) around a JSON body.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the auditor's JSON reply into a verdict.
///
/// Anything that is not a JSON object with a boolean `is_safe` maps to
/// [`AuditVerdict::parse_failed`].
pub fn parse_audit_response(raw: &str) -> AuditVerdict {
    match serde_json::from_str::<RawVerdict>(strip_code_fence(raw)) {
        Ok(parsed) => AuditVerdict {
            is_safe: parsed.is_safe,
            reason: parsed
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| REASON_MISSING.to_string()),
            corrected_advice: parsed.corrected_advice,
        },
        Err(e) => {
            tracing::warn!(error = %e, response_len = raw.len(), "Audit response is not a valid verdict");
            AuditVerdict::parse_failed()
        }
    }
}

/// Check a draft against the grounding text. Never fails: an unreachable
/// model or an unreadable reply yields a fail-safe verdict.
pub fn audit_safety(
    endpoint: &ModelEndpoint,
    grounding: Option<&str>,
    draft: &str,
    language: AdviceLanguage,
) -> AuditVerdict {
    let prompt = build_auditor_prompt(grounding, draft, language);

    let Some(raw) = endpoint.call("auditor", &prompt, GenerationOptions::json(AUDITOR_TEMPERATURE))
    else {
        tracing::warn!("Audit skipped, model call did not complete");
        return AuditVerdict::skipped_overloaded();
    };

    let verdict = parse_audit_response(&raw);
    tracing::info!(
        is_safe = verdict.is_safe,
        has_correction = verdict.correction().is_some(),
        reason = %verdict.reason,
        "Audit complete"
    );
    verdict
}
