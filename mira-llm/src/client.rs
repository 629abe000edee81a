use crate::config::{ChatRequest, ReactionConfig};
use crate::error::{LLMError, Result};
use crate::generator::{build_messages, ReactionGenerator};
use async_trait::async_trait;
use mira_core::Situation;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

const MAX_ERROR_BODY: usize = 500;

/// Client for an OpenAI-compatible `chat/completions` endpoint such as
/// LM Studio's local server. No API key is sent.
pub struct ChatCompletionClient {
    config: ReactionConfig,
    client: Client,
}

impl ChatCompletionClient {
    pub fn new(config: ReactionConfig) -> Result<Self> {
        config.validate().map_err(LLMError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ReactionConfig {
        &self.config
    }

    fn request_for(&self, situation: &Situation) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: build_messages(&self.config, situation),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        }
    }

    /// Send one chat request and return the first choice's content
    pub async fn complete(&self, request: &ChatRequest) -> Result<String> {
        debug!("Posting chat request to {} (model {})", self.config.endpoint, request.model);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            let body = if text.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                text[..end].to_string()
            } else {
                text
            };
            return Err(LLMError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_transport(e))?;
        let json: serde_json::Value = serde_json::from_slice(&bytes)?;
        extract_content(&json)
    }

    fn map_transport(&self, err: reqwest::Error) -> LLMError {
        if err.is_timeout() {
            LLMError::Timeout(self.config.timeout_secs)
        } else {
            LLMError::HttpRequest(err)
        }
    }
}

/// Pull `choices[0].message.content` out of a completion body
pub fn extract_content(json: &serde_json::Value) -> Result<String> {
    let choices = json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| LLMError::InvalidResponse("Invalid response format: no choices array".to_string()))?;

    let choice = choices
        .first()
        .ok_or_else(|| LLMError::InvalidResponse("No choices in response".to_string()))?;

    let content = choice["message"]["content"]
        .as_str()
        .ok_or_else(|| LLMError::InvalidResponse("Choice has no message content".to_string()))?;

    if content.trim().is_empty() {
        return Err(LLMError::InvalidResponse("Empty message content".to_string()));
    }

    Ok(content.to_string())
}

#[async_trait]
impl ReactionGenerator for ChatCompletionClient {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    async fn react(&self, situation: &Situation) -> Result<String> {
        let request = self.request_for(situation);
        self.complete(&request).await
    }
}
