use std::sync::Arc;

use thiserror::Error;

use crate::ai::{build_prompt, interpret, CompletionService, Interpretation};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("email content is empty")]
    InvalidInput,

    #[error("classification failed: {0:#}")]
    ClassificationFailed(anyhow::Error),
}

/// Prompt, model call and reply interpretation for a single email.
///
/// Persisting the outcome is left to the caller so a storage failure can
/// never swallow a verdict.
pub struct ClassificationPipeline {
    model: Arc<dyn CompletionService>,
}

impl ClassificationPipeline {
    pub fn new(model: Arc<dyn CompletionService>) -> Self {
        Self { model }
    }

    /// One attempt, no retry.
    pub async fn classify(&self, email_content: &str) -> Result<Interpretation, ClassifyError> {
        if email_content.trim().is_empty() {
            return Err(ClassifyError::InvalidInput);
        }

        let prompt = build_prompt(email_content);
        tracing::info!(
            target: "pipeline",
            chars = email_content.chars().count(),
            "classifying email"
        );

        let reply = self.model.complete(&prompt).await.map_err(|err| {
            tracing::error!(target: "pipeline", error = ?err, "model call failed");
            ClassifyError::ClassificationFailed(err)
        })?;

        let interpretation = interpret(&reply);
        match &interpretation {
            Interpretation::Parsed(result) => tracing::info!(
                target: "pipeline",
                classification = %result.classification,
                confidence = result.confidence_score,
                risk = %result.risk_level,
                "email classified"
            ),
            Interpretation::Fallback { result, reason } => tracing::warn!(
                target: "pipeline",
                classification = %result.classification,
                reason = %reason,
                "structured reply unusable; heuristic verdict used"
            ),
        }
        Ok(interpretation)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use anyhow::{anyhow, Result};
    use futures::future::BoxFuture;

    use super::*;
    use crate::domain::{Classification, RiskLevel};

    struct ScriptedModel {
        reply: Result<String, String>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CompletionService for ScriptedModel {
        fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            let reply = self.reply.clone().map_err(|msg| anyhow!(msg));
            Box::pin(async move { reply })
        }
    }

    #[tokio::test]
    async fn blank_input_never_reaches_model() {
        let model = ScriptedModel::replying("{}");
        let pipeline = ClassificationPipeline::new(model.clone());

        for input in ["", "   ", "\n\t "] {
            let err = pipeline.classify(input).await.unwrap_err();
            assert!(matches!(err, ClassifyError::InvalidInput));
        }
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn parsed_reply_is_returned() {
        let model = ScriptedModel::replying(
            r#"Sure! {"classification":"spam","confidence_score":97,"reasoning":"Credential phishing","spam_indicators":["urgent tone","password request"],"risk_level":"high"}"#,
        );
        let pipeline = ClassificationPipeline::new(model.clone());

        let email = "Your account will be suspended. Send your password.";
        let interpretation = pipeline.classify(email).await.unwrap();
        let result = match interpretation {
            Interpretation::Parsed(result) => result,
            other => panic!("expected parsed result, got {other:?}"),
        };
        assert_eq!(result.classification, Classification::Spam);
        assert_eq!(result.confidence_score, 97);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(model.calls(), 1);

        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains(email));
    }

    #[tokio::test]
    async fn malformed_reply_degrades_to_fallback() {
        let model = ScriptedModel::replying("This message is definitely spam.");
        let pipeline = ClassificationPipeline::new(model);

        let interpretation = pipeline.classify("cheap pills").await.unwrap();
        assert!(interpretation.is_fallback());
        assert_eq!(interpretation.result().confidence_score, 75);
        assert_eq!(interpretation.result().classification, Classification::Spam);
    }

    #[tokio::test]
    async fn model_errors_surface_with_cause() {
        let model = ScriptedModel::failing("quota exceeded");
        let pipeline = ClassificationPipeline::new(model.clone());

        let err = pipeline.classify("hello").await.unwrap_err();
        match err {
            ClassifyError::ClassificationFailed(cause) => {
                assert!(cause.to_string().contains("quota exceeded"))
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(model.calls(), 1);
    }
}
