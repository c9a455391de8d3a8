use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::Client;

use crate::config::GeminiConfig;

use super::{
    inference::{build_request, endpoint, extract_text, GenerateContentResponse},
    CompletionService,
};

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(http: Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .context("GEMINI_API_KEY must be configured for spam classification")?;

        let url = endpoint(&self.config)?;
        let request = build_request(&self.config, prompt);
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .context("failed to reach Gemini")?
            .error_for_status()?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .context("failed to decode Gemini response")?;
        let text = extract_text(body)?;

        tracing::debug!(
            target: "ai",
            model = %self.config.model,
            chars = text.len(),
            "Gemini reply received"
        );
        Ok(text)
    }
}

impl CompletionService for GeminiClient {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.generate(prompt))
    }
}
