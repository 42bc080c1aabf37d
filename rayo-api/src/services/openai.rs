//! OpenAI chat-completions client
//!
//! All generation steps (keywords, category, title, outline, intent fallback)
//! go through `complete`, which sends a system/user message pair and returns
//! the assistant's text.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// OpenAI chat completions endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default timeout for OpenAI requests (generation can be slow)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("OpenAI request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OpenAI returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("OpenAI response had no choices")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// OpenAI chat client
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, OpenAiError> {
        Ok(Self {
            http_client: Client::builder().timeout(DEFAULT_TIMEOUT).build()?,
            api_key,
            model,
        })
    }

    /// Run one chat completion and return the assistant's text, trimmed.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, OpenAiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        };

        let response = self
            .http_client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OpenAiError::Status(response.status()));
        }

        let body: ChatResponse = response.json().await?;

        if let Some(usage) = &body.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenAI completion finished"
            );
        }

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or(OpenAiError::EmptyResponse)
    }
}
