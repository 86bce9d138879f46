use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Placeholder grounding when the scan did not identify a record.
pub const NO_GROUNDING: &str = "No matching FDA record was found for this product.";

/// Generated advice is capped at this many words.
pub const MAX_ADVICE_WORDS: usize = 120;

/// Language and register of everything the end user hears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceLanguage {
    #[default]
    Vietnamese,
    English,
}

impl AdviceLanguage {
    pub fn code(self) -> &'static str {
        match self {
            Self::Vietnamese => "vi",
            Self::English => "en",
        }
    }

    /// Name used inside prompts.
    pub fn name(self) -> &'static str {
        match self {
            Self::Vietnamese => "Vietnamese",
            Self::English => "English",
        }
    }

    /// Phrase every draft must open with.
    pub fn opening_phrase(self) -> &'static str {
        match self {
            Self::Vietnamese => "Dạ thưa ạ",
            Self::English => "Dear friend",
        }
    }

    /// Returned when no draft could be generated.
    pub fn apology(self) -> &'static str {
        match self {
            Self::Vietnamese => "Xin lỗi ạ, hệ thống đang gặp sự cố.",
            Self::English => "Sorry, the system is having a problem right now.",
        }
    }

    /// Returned when the audit rejects the draft without offering a correction.
    pub fn refusal(self) -> &'static str {
        match self {
            Self::Vietnamese => "Xin lỗi ạ, thông tin thuốc phức tạp con cần kiểm tra lại ạ.",
            Self::English => {
                "Sorry, this medicine information is complicated and needs to be checked again."
            }
        }
    }
}

impl fmt::Display for AdviceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AdviceLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vi" | "vietnamese" => Ok(Self::Vietnamese),
            "en" | "english" => Ok(Self::English),
            other => Err(format!("unsupported advice language '{other}'")),
        }
    }
}

/// Instruction for the generator ("doctor") role.
pub fn build_generator_prompt(context: &str, grounding: Option<&str>, language: AdviceLanguage) -> String {
    let grounding = grounding.unwrap_or(NO_GROUNDING);
    let lang = language.name();
    let opening = language.opening_phrase();

    format!(
        r#"
ROLE: Compassionate {lang}-speaking family doctor.

TASK: Draft medication advice for a 70-year-old grandmother.

FDA DATA (TRUTH):
{grounding}

USER QUERY:
{context}

GUIDELINES:
1. Translate medical terms to simple {lang}.
2. Start with "{opening}".
3. Briefly explain what this medicine is, how it is used in general (route and dosage form), and its general purpose, using simple {lang} for a 70-year-old.
4. You may mention strength, quantity, and expiry only to describe the product, not to give a dosing schedule.
5. Keep it under {MAX_ADVICE_WORDS} words.
6. NO markdown formatting. Plain text only.
"#
    )
}

/// Instruction for the auditor role. The reply must be a JSON verdict.
pub fn build_auditor_prompt(grounding: Option<&str>, draft: &str, language: AdviceLanguage) -> String {
    let grounding = grounding.unwrap_or(NO_GROUNDING);
    let lang = language.name();

    format!(
        r#"
ROLE: Medical AI Auditor.

TASK: Verify if the Doctor's advice aligns strictly with FDA Data.

SOURCE DATA (FDA):
{grounding}

DRAFT ADVICE TO CHECK:
{draft}

CRITERIA:

1. ALLOWED:
- Mention common, well-established indications and class-level warnings for this drug class, even if they are not fully listed in the FDA excerpt above.
- Use brand/generic name, class, dosage form, route, strength, quantity, and expiry only to describe the product, not to propose or imply any dosing regimen (number of tablets, times per day, treatment duration) or to judge whether the dose is "high" or "low".

2. NOT ALLOWED:
- Invent specific dosages or dosing schedules, detailed "how to take" instructions, or indications clearly inappropriate for this drug class.

3. SEVERE ERROR:
- Encourage use in clearly inappropriate patients, use the wrong route of administration, or ignore/contradict serious warnings present in the FDA data.

OUTPUT FORMAT (JSON ONLY):
{{
  "is_safe": true/false,
  "reason": "English explanation of the error",
  "corrected_advice": "Rewritten {lang} advice if unsafe, else null"
}}
"#
    )
}
