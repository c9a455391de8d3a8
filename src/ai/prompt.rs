/// Embeds the email verbatim in the classification instructions.
///
/// Empty input is not rejected here; the pipeline filters it before a prompt
/// is ever built.
pub fn build_prompt(email_content: &str) -> String {
    format!(
        r#"You are an expert email spam classifier. Analyze the following email content and determine if it's spam or not spam.

Email Content:
"""
{email_content}
"""

Please analyze this email based on the following criteria:
1. Suspicious sender patterns
2. Urgency and pressure tactics
3. Financial offers or requests
4. Suspicious links or attachments mentions
5. Grammar and spelling quality
6. Legitimate business communication patterns

Provide your response in the following JSON format:
{{
    "classification": "spam" or "not_spam",
    "confidence_score": [0-100],
    "reasoning": "Brief explanation of your decision",
    "spam_indicators": ["list", "of", "specific", "indicators", "found"],
    "risk_level": "low", "medium", or "high"
}}

Be thorough but concise in your analysis."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_content_inside_delimiters() {
        let email = "Subject: Win $$$\n\nClick {here} now!";
        let prompt = build_prompt(email);
        assert!(prompt.contains(&format!("\"\"\"\n{email}\n\"\"\"")));
    }

    #[test]
    fn lists_criteria_and_schema_keys() {
        let prompt = build_prompt("hi");
        for needle in [
            "Suspicious sender patterns",
            "Urgency and pressure tactics",
            "Financial offers or requests",
            "Suspicious links or attachments",
            "Grammar and spelling quality",
            "Legitimate business communication patterns",
            "\"classification\"",
            "\"confidence_score\"",
            "\"reasoning\"",
            "\"spam_indicators\"",
            "\"risk_level\"",
        ] {
            assert!(prompt.contains(needle), "prompt is missing {needle}");
        }
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(build_prompt("same"), build_prompt("same"));
    }
}
