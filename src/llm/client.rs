use anyhow::Context;
use axum::async_trait;
use tracing::debug;

use super::dto::{ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::OpenAiConfig;

/// Text-generation seam shared by the nutrient estimator and the chat relay.
///
/// `Ok(None)` means the call succeeded but the service returned no content.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> anyhow::Result<Option<String>>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> anyhow::Result<Option<String>> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
            max_tokens,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            anyhow::bail!("chat completion failed with {}: {}", status, message);
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .context("decode chat completion")?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        debug!(model = %self.model, has_content = content.is_some(), "chat completion received");
        Ok(content)
    }
}
