//! # ai — call the OpenAI or Claude API
//!
//! [`DecisionOracle`] is the seam between the decider and the reasoning
//! service. [`LlmOracle`] is the HTTP implementation; tests plug in stubs.
//!
//! Both providers are called with temperature 0. OpenAI additionally gets a
//! `json_object` response-format hint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AiProvider, Config};
use crate::error::DecisionServiceError;
use crate::models::Signal;
use crate::prompt::{DecisionRequest, PromptMessage};
use crate::response::parse_signal;

/// Anything that can turn a [`DecisionRequest`] into a validated [`Signal`].
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn decide(&self, request: &DecisionRequest) -> Result<Signal, DecisionServiceError>;

    fn name(&self) -> &str;
}

/// Reasoning service reached over HTTP.
pub struct LlmOracle {
    client:   reqwest::Client,
    provider: AiProvider,
    api_key:  String,
    model:    String,
    timeout:  std::time::Duration,
}

impl LlmOracle {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            provider: config.ai_provider,
            api_key:  config.ai_api_key.clone(),
            model:    config.ai_model.clone(),
            timeout:  config.ai_timeout,
        }
    }

    /// Raw text response (JSON string that is not parsed yet).
    async fn call_ai(&self, messages: &[PromptMessage]) -> Result<String, DecisionServiceError> {
        match self.provider {
            AiProvider::OpenAi => self.call_openai(messages).await,
            AiProvider::Claude => self.call_claude(messages).await,
        }
    }
}

#[async_trait]
impl DecisionOracle for LlmOracle {
    async fn decide(&self, request: &DecisionRequest) -> Result<Signal, DecisionServiceError> {
        let text = self.call_ai(&request.messages()).await?;
        debug!(chars = text.len(), "AI response received");
        parse_signal(&text, request)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, DecisionServiceError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(DecisionServiceError::from_status(status, body))
}

// ─── OpenAI Chat Completions ──────────────────────────────────────────────────

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model:           &'a str,
    messages:        Vec<OpenAiMessage<'a>>,
    temperature:     f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role:    &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMsg,
}

#[derive(Deserialize)]
struct OpenAiChoiceMsg {
    content: Option<String>,
}

impl LlmOracle {
    async fn call_openai(&self, messages: &[PromptMessage]) -> Result<String, DecisionServiceError> {
        let body = OpenAiRequest {
            model:           &self.model,
            messages:        messages
                .iter()
                .map(|m| OpenAiMessage { role: m.role, content: &m.content })
                .collect(),
            temperature:     0.0,
            response_format: ResponseFormat { kind: "json_object" },
        };

        debug!(model = %self.model, "Calling OpenAI API...");

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        let data: OpenAiResponse = error_for_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| DecisionServiceError::InvalidOutput(format!("OpenAI response parse error: {e}")))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(DecisionServiceError::EmptyResponse)
    }
}

// ─── Anthropic Claude ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model:       &'a str,
    max_tokens:  u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system:      Option<&'a str>,
    messages:    Vec<ClaudeMessage<'a>>,
}

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role:    &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: Option<String>,
}

impl LlmOracle {
    async fn call_claude(&self, messages: &[PromptMessage]) -> Result<String, DecisionServiceError> {
        // Claude takes the system prompt as a top-level field.
        let system = messages.iter().find(|m| m.role == "system").map(|m| m.content.as_str());
        let body = ClaudeRequest {
            model:       &self.model,
            max_tokens:  512,
            temperature: 0.0,
            system,
            messages:    messages
                .iter()
                .filter(|m| m.role != "system")
                .map(|m| ClaudeMessage { role: m.role, content: &m.content })
                .collect(),
        };

        debug!(model = %self.model, "Calling Claude API...");

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        let data: ClaudeResponse = error_for_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| DecisionServiceError::InvalidOutput(format!("Claude response parse error: {e}")))?;

        data.content
            .into_iter()
            .find_map(|c| c.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(DecisionServiceError::EmptyResponse)
    }
}
