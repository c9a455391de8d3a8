use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{Classification, ClassificationResult, RiskLevel};

static OBJECT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));

pub const FALLBACK_CONFIDENCE: u8 = 75;
pub const FALLBACK_REASONING: &str = "Analyzed based on content patterns";
pub const FALLBACK_INDICATOR: &str = "Analysis completed";

/// What the interpreter made of a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// The reply carried a well-formed result.
    Parsed(ClassificationResult),
    /// Structured extraction failed; `result` comes from the keyword heuristic.
    Fallback {
        result: ClassificationResult,
        reason: String,
    },
}

impl Interpretation {
    pub fn result(&self) -> &ClassificationResult {
        match self {
            Interpretation::Parsed(result) => result,
            Interpretation::Fallback { result, .. } => result,
        }
    }

    pub fn into_result(self) -> ClassificationResult {
        match self {
            Interpretation::Parsed(result) => result,
            Interpretation::Fallback { result, .. } => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Interpretation::Fallback { .. })
    }
}

/// Never fails: anything that does not decode cleanly degrades to [`fallback_result`].
pub fn interpret(reply: &str) -> Interpretation {
    match parse_structured(reply) {
        Ok(result) => Interpretation::Parsed(result),
        Err(reason) => Interpretation::Fallback {
            result: fallback_result(reply),
            reason,
        },
    }
}

fn parse_structured(reply: &str) -> Result<ClassificationResult, String> {
    let object = OBJECT_REGEX
        .find(reply)
        .ok_or_else(|| "no JSON object in reply".to_string())?;
    let result: ClassificationResult =
        serde_json::from_str(object.as_str()).map_err(|err| format!("invalid JSON: {err}"))?;
    result.validate()?;
    Ok(result)
}

pub fn fallback_result(reply: &str) -> ClassificationResult {
    let lower = reply.to_lowercase();
    let classification = if lower.contains("spam") && !lower.contains("not spam") {
        Classification::Spam
    } else {
        Classification::NotSpam
    };

    ClassificationResult {
        classification,
        confidence_score: FALLBACK_CONFIDENCE,
        reasoning: FALLBACK_REASONING.to_string(),
        spam_indicators: vec![FALLBACK_INDICATOR.to_string()],
        risk_level: RiskLevel::Medium,
    }
}
