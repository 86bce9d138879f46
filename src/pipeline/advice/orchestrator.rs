use serde::{Deserialize, Serialize};

use super::auditor::{audit_safety, AuditVerdict};
use super::endpoint::ModelEndpoint;
use super::generator::generate_draft_advice;
use super::prompt::AdviceLanguage;
use super::speech::clean_text_for_speech;

/// Where an advice run is, or where it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceStage {
    Generating,
    Auditing,
    /// Audit accepted the draft as written.
    Passed,
    /// Audit rejected the draft and supplied a replacement.
    Corrected,
    /// Audit rejected the draft with nothing to replace it.
    Refused,
    /// No draft could be produced.
    GenerationFailed,
}

impl AdviceStage {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Generating | Self::Auditing)
    }
}

/// Final advice plus how the pipeline got there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceOutcome {
    pub stage: AdviceStage,
    /// Text to show or speak. Always plain text.
    pub text: String,
    pub draft: Option<String>,
    pub verdict: Option<AuditVerdict>,
}

impl AdviceOutcome {
    /// `text` with leftover markup removed, ready for a speech synthesizer.
    pub fn speech_text(&self) -> String {
        clean_text_for_speech(&self.text)
    }
}

/// Final-selection rule applied to an audited draft.
pub fn select_final(draft: &str, verdict: &AuditVerdict, language: AdviceLanguage) -> (AdviceStage, String) {
    if verdict.is_safe {
        return (AdviceStage::Passed, draft.to_string());
    }
    match verdict.correction() {
        Some(corrected) => (AdviceStage::Corrected, corrected.to_string()),
        None => (AdviceStage::Refused, language.refusal().to_string()),
    }
}

/// Generator then auditor then final selection, strictly in sequence.
///
/// Never fails: every model failure ends in a fixed message in the
/// configured language.
pub struct AdvicePipeline {
    endpoint: ModelEndpoint,
    language: AdviceLanguage,
}

impl AdvicePipeline {
    pub fn new(endpoint: ModelEndpoint, language: AdviceLanguage) -> Self {
        Self { endpoint, language }
    }

    pub fn language(&self) -> AdviceLanguage {
        self.language
    }

    pub fn endpoint(&self) -> &ModelEndpoint {
        &self.endpoint
    }

    /// Run both roles over `context`, grounded in `grounding` when a record
    /// was identified.
    pub fn run(&self, context: &str, grounding: Option<&str>) -> AdviceOutcome {
        let _span = tracing::info_span!(
            "advice",
            provider = self.endpoint.provider(),
            model = %self.endpoint.model(),
            lang = %self.language,
            grounded = grounding.is_some()
        )
        .entered();

        tracing::debug!(stage = ?AdviceStage::Generating, "Advice stage");
        let Some(draft) = generate_draft_advice(&self.endpoint, context, grounding, self.language)
        else {
            tracing::warn!(stage = ?AdviceStage::GenerationFailed, "No draft produced, returning apology");
            return AdviceOutcome {
                stage: AdviceStage::GenerationFailed,
                text: self.language.apology().to_string(),
                draft: None,
                verdict: None,
            };
        };

        tracing::debug!(stage = ?AdviceStage::Auditing, "Advice stage");
        let verdict = audit_safety(&self.endpoint, grounding, &draft, self.language);
        let (stage, text) = select_final(&draft, &verdict, self.language);

        tracing::info!(stage = ?stage, "Advice complete");
        AdviceOutcome {
            stage,
            text,
            draft: Some(draft),
            verdict: Some(verdict),
        }
    }

    /// Convenience wrapper returning only the final text.
    pub fn advise(&self, context: &str, grounding: Option<&str>) -> String {
        self.run(context, grounding).text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::advice::mock::ScriptedLlmClient;
    use crate::pipeline::advice::retry::{RetryDispatcher, RetryPolicy};
    use crate::pipeline::advice::LlmError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const CONTEXT: &str = "Drug: Bexarotene, Dosage: 75 mg, Qty: N/A, Exp: N/A";
    const GROUNDING: &str = "Brand Name: Bexarotene\nActive Ingredient: Bexarotene";
    const DRAFT: &str = "Dạ thưa ạ, đây là thuốc Bexarotene. Uống 2 viên mỗi ngày.";

    fn pipeline(script: Vec<Result<String, LlmError>>) -> (AdvicePipeline, Arc<AtomicUsize>) {
        let client = ScriptedLlmClient::new(script);
        let calls = client.call_counter();
        let endpoint = ModelEndpoint::new(
            Box::new(client),
            "gemini-2.5-flash",
            RetryDispatcher::new(RetryPolicy::new(3, Duration::ZERO)),
        );
        (AdvicePipeline::new(endpoint, AdviceLanguage::Vietnamese), calls)
    }

    fn overloaded() -> LlmError {
        LlmError::Api {
            status: 503,
            body: "UNAVAILABLE: The model is overloaded.".into(),
        }
    }

    #[test]
    fn corrected_advice_returned_verbatim() {
        let corrected = "Dạ thưa ạ, Bexarotene là thuốc dạng viên nang, dùng đường uống.";
        let audit = serde_json::json!({
            "is_safe": false,
            "reason": "implies dosing schedule",
            "corrected_advice": corrected,
        });
        let (pipeline, calls) = pipeline(vec![Ok(DRAFT.into()), Ok(audit.to_string())]);

        let outcome = pipeline.run(CONTEXT, Some(GROUNDING));

        assert_eq!(outcome.stage, AdviceStage::Corrected);
        assert_eq!(outcome.text, corrected);
        assert_eq!(outcome.draft.as_deref(), Some(DRAFT));
        assert_eq!(outcome.verdict.unwrap().reason, "implies dosing schedule");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn generation_failure_skips_audit() {
        let (pipeline, calls) = pipeline(vec![Err(overloaded()), Err(overloaded()), Err(overloaded())]);

        let outcome = pipeline.run(CONTEXT, Some(GROUNDING));

        assert_eq!(outcome.stage, AdviceStage::GenerationFailed);
        assert_eq!(outcome.text, "Xin lỗi ạ, hệ thống đang gặp sự cố.");
        assert!(outcome.draft.is_none());
        assert!(outcome.verdict.is_none());
        // Only the generator's three attempts; the auditor never ran.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn safe_draft_passes_unchanged() {
        let (pipeline, _) = pipeline(vec![
            Ok(DRAFT.into()),
            Ok(r#"{"is_safe": true, "reason": "ok", "corrected_advice": null}"#.into()),
        ]);
        let outcome = pipeline.run(CONTEXT, Some(GROUNDING));
        assert_eq!(outcome.stage, AdviceStage::Passed);
        assert_eq!(outcome.text, DRAFT);
    }

    #[test]
    fn unsafe_without_correction_is_refused() {
        for audit in [
            r#"{"is_safe": false, "reason": "wrong route", "corrected_advice": null}"#,
            r#"{"is_safe": false, "reason": "wrong route", "corrected_advice": ""}"#,
        ] {
            let (pipeline, _) = pipeline(vec![Ok(DRAFT.into()), Ok(audit.into())]);
            let outcome = pipeline.run(CONTEXT, Some(GROUNDING));
            assert_eq!(outcome.stage, AdviceStage::Refused);
            assert_eq!(outcome.text, "Xin lỗi ạ, thông tin thuốc phức tạp con cần kiểm tra lại ạ.");
        }
    }

    #[test]
    fn failed_audit_keeps_draft() {
        let (pipeline, _) = pipeline(vec![Ok(DRAFT.into()), Ok("I cannot answer that.".into())]);
        let outcome = pipeline.run(CONTEXT, None);
        assert_eq!(outcome.stage, AdviceStage::Passed);
        assert_eq!(outcome.text, DRAFT);
        assert_eq!(outcome.verdict, Some(AuditVerdict::parse_failed()));
    }

    #[test]
    fn overloaded_audit_keeps_draft() {
        let (pipeline, _) = pipeline(vec![
            Ok(DRAFT.into()),
            Err(overloaded()),
            Err(overloaded()),
            Err(overloaded()),
        ]);
        assert_eq!(pipeline.advise(CONTEXT, Some(GROUNDING)), DRAFT);
    }

    #[test]
    fn speech_text_strips_markup() {
        let outcome = AdviceOutcome {
            stage: AdviceStage::Passed,
            text: "**Dạ thưa ạ**,  thuốc   Advil.".into(),
            draft: None,
            verdict: None,
        };
        assert_eq!(outcome.speech_text(), "Dạ thưa ạ, thuốc Advil.");
    }

    #[test]
    fn terminal_stages() {
        assert!(!AdviceStage::Generating.is_terminal());
        assert!(!AdviceStage::Auditing.is_terminal());
        for stage in [AdviceStage::Passed, AdviceStage::Corrected, AdviceStage::Refused, AdviceStage::GenerationFailed] {
            assert!(stage.is_terminal());
        }
    }

    #[test]
    fn english_register_refusal() {
        let verdict = AuditVerdict {
            is_safe: false,
            reason: "x".into(),
            corrected_advice: None,
        };
        let (stage, text) = select_final("draft", &verdict, AdviceLanguage::English);
        assert_eq!(stage, AdviceStage::Refused);
        assert_eq!(text, AdviceLanguage::English.refusal());
    }
}
