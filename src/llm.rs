//! Reasoning Client - chat-completion access to a generative model
//!
//! The rest of the crate only sees [`ReasoningClient::complete`], which returns
//! plain generated text. Provider response shapes are normalized here.

use crate::config::LlmConfig;
use crate::error::{AutofixError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message in OpenAI chat format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// One call to the model: ordered prompt messages plus sampling temperature
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl CompletionRequest {
    /// The usual two-message layout: a fixed system instruction and one user turn
    pub fn new(system: &str, user: String, temperature: f32) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
        }
    }
}

#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Generate text for the given prompt set
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Bodies we accept from a provider.
///
/// OpenAI-compatible servers answer with `choices`; Ollama's native API puts
/// the text in `response`. Anything else carrying `error` is a failure.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompletionBody {
    Chat { choices: Vec<Choice> },
    Generate { response: String },
    Failure { error: serde_json::Value },
}

impl CompletionBody {
    fn into_text(self) -> Result<String> {
        let text = match self {
            CompletionBody::Chat { choices } => {
                let choice = choices
                    .into_iter()
                    .next()
                    .ok_or_else(|| AutofixError::Llm("Empty choices array in LLM response".to_string()))?;

                match choice.finish_reason.as_deref() {
                    Some("length") => warn!("LLM response was truncated due to length limit"),
                    Some("content_filter") => {
                        return Err(AutofixError::Llm("LLM response was filtered by content policy".to_string()));
                    }
                    _ => {}
                }

                choice.message.content.unwrap_or_default()
            }
            CompletionBody::Generate { response } => response,
            CompletionBody::Failure { error } => {
                return Err(AutofixError::Llm(format!("LLM API error: {}", error)));
            }
        };

        if text.trim().is_empty() {
            return Err(AutofixError::Llm("Empty content in LLM response".to_string()));
        }
        Ok(text)
    }
}

/// Normalize a raw provider body into generated text
pub fn parse_completion(body: &str) -> Result<String> {
    let parsed: CompletionBody = serde_json::from_str(body)
        .map_err(|e| AutofixError::Llm(format!("Unrecognized LLM response: {}. Response: {}", e, body)))?;
    parsed.into_text()
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AutofixError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_url.clone(),
            config.timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ReasoningClient for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            stream: false,
        };

        debug!(model = %self.model, temperature = request.temperature, "Calling LLM");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AutofixError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AutofixError::Llm(format!("Failed to read LLM response: {}", e)))?;

        if !status.is_success() {
            return Err(AutofixError::Llm(format!("LLM API error ({}): {}", status, text)));
        }

        parse_completion(&text)
    }
}
