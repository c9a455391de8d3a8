use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Spam,
    NotSpam,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Spam => "spam",
            Classification::NotSpam => "not_spam",
        }
    }

    pub fn is_spam(&self) -> bool {
        matches!(self, Classification::Spam)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for a single email as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub classification: Classification,
    /// Always within `0..=100`.
    pub confidence_score: u8,
    pub reasoning: String,
    pub spam_indicators: Vec<String>,
    pub risk_level: RiskLevel,
}

impl ClassificationResult {
    pub const MAX_CONFIDENCE: u8 = 100;

    /// Checks the value-domain rules serde cannot express on its own.
    pub fn validate(&self) -> Result<(), String> {
        if self.confidence_score > Self::MAX_CONFIDENCE {
            return Err(format!(
                "confidence_score {} is outside 0..=100",
                self.confidence_score
            ));
        }
        if self.reasoning.trim().is_empty() {
            return Err("reasoning is empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_wire_names() {
        let json = serde_json::to_string(&Classification::NotSpam).unwrap();
        assert_eq!(json, "\"not_spam\"");
        let risk: RiskLevel = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(risk, RiskLevel::High);
        assert!(serde_json::from_str::<Classification>("\"maybe\"").is_err());
    }

    #[test]
    fn validate_rejects_out_of_domain_values() {
        let mut result = ClassificationResult {
            classification: Classification::Spam,
            confidence_score: 101,
            reasoning: "x".into(),
            spam_indicators: vec![],
            risk_level: RiskLevel::Low,
        };
        assert!(result.validate().is_err());

        result.confidence_score = 100;
        assert!(result.validate().is_ok());

        result.reasoning = "   ".into();
        assert!(result.validate().is_err());
    }
}
