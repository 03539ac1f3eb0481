// ABOUTME: Anthropic Messages API client behind the TextGenerator capability
// ABOUTME: Returns the raw text of the model's reply; parsing and validation belong to callers

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Output ceiling per model family; question sets for large portfolios need the larger one
fn max_tokens_for(model: &str) -> u32 {
    if model.contains("haiku") {
        1024
    } else {
        4096
    }
}

#[derive(Debug, Error)]
pub enum AIServiceError {
    #[error("Request to the model provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model provider did not answer in time")]
    TimedOut,

    #[error("Unreadable provider response: {0}")]
    Decode(String),

    #[error("ANTHROPIC_API_KEY is not configured")]
    NoApiKey,

    #[error("Provider response contained no text")]
    EmptyResponse,
}

pub type AIServiceResult<T> = Result<T, AIServiceError>;

/// A single prompt for the text-generation capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// The external text-generation capability: prompt in, untrusted raw text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> AIServiceResult<String>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [UserMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug)]
pub struct AIResponse<T> {
    pub data: T,
    pub usage: Usage,
}

/// Extract the body of a markdown code fence (```json ... ```).
///
/// The fence may follow leading prose, open and close on one line, or be left
/// unterminated. Text that already starts as a JSON value is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let rest = &trimmed[open + 3..];
    // Drop the info string (`json`, `JSON`, ...) when one follows the opening fence
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let rest = match rest[tag_len..].chars().next() {
        Some(c) if c.is_whitespace() => &rest[tag_len..],
        None => "",
        Some(_) => rest,
    };

    let body = match rest.rfind("```") {
        Some(close) => &rest[..close],
        None => rest,
    };
    body.trim()
}

/// Client for the Anthropic Messages API
pub struct AIService {
    client: Client,
    api_key: Option<String>,
    model: String,
    api_url: String,
}

impl AIService {
    /// A client for the default model; without a key every call fails with `NoApiKey`
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("No Anthropic API key configured; generation calls will fail");
        }

        Self {
            client: build_client(DEFAULT_REQUEST_TIMEOUT),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        if self.model != DEFAULT_MODEL {
            info!("Using Anthropic model {}", self.model);
        }
        self
    }

    /// Point the client at a different Messages endpoint (proxies, tests)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one user message and return the text of the first text block
    pub async fn generate_text(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> AIServiceResult<AIResponse<String>> {
        let api_key = self.api_key.as_deref().ok_or(AIServiceError::NoApiKey)?;

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: max_tokens_for(&self.model),
            temperature: DEFAULT_TEMPERATURE,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
            system: system_prompt,
        };

        debug!(
            "Anthropic request: model={}, max_tokens={}, prompt_chars={}",
            body.model,
            body.max_tokens,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Anthropic request timed out");
                    AIServiceError::TimedOut
                } else {
                    error!("Anthropic request failed: {}", e);
                    AIServiceError::Transport(e)
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!("Anthropic returned {}: {}", status, body);
            return Err(AIServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AIServiceError::Decode(e.to_string()))?;

        let text = reply
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .ok_or(AIServiceError::EmptyResponse)?;

        Ok(AIResponse {
            data: text,
            usage: reply.usage,
        })
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            error!("Failed to build HTTP client with timeouts, using defaults: {}", e);
            Client::new()
        })
}

#[async_trait]
impl TextGenerator for AIService {
    async fn generate(&self, request: &GenerationRequest) -> AIServiceResult<String> {
        let response = self
            .generate_text(&request.prompt, request.system_prompt.as_deref())
            .await?;
        info!(
            "Generation used {} tokens ({} in / {} out)",
            response.usage.total_tokens(),
            response.usage.input_tokens,
            response.usage.output_tokens
        );
        Ok(response.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences_with_language_tag() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fences_without_fence() {
        assert_eq!(strip_code_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fences_with_unterminated_fence() {
        assert_eq!(strip_code_fences("```\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fences_on_a_single_line() {
        let raw = "```json {\"follow_up\":[]} ```";
        assert_eq!(strip_code_fences(raw), "{\"follow_up\":[]}");
        assert_eq!(strip_code_fences("```{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fences_after_leading_prose() {
        let raw = "Here is the JSON:\n```json\n{\"a\": 1}\n```\nLet me know if you need more.";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fences_keeps_fences_inside_json_values() {
        let raw = "{\"text\": \"Explain ```unsafe``` blocks\"}";
        assert_eq!(strip_code_fences(raw), raw);
    }

    #[test]
    fn test_max_tokens_per_model_family() {
        assert_eq!(max_tokens_for("claude-3-haiku-20240307"), 1024);
        assert_eq!(max_tokens_for("claude-sonnet-4-20250514"), 4096);
        assert_eq!(max_tokens_for("something-else"), 4096);
    }

    #[tokio::test]
    async fn test_generate_without_key_fails_fast() {
        let service = AIService::new(None);
        let result = service.generate(&GenerationRequest::new("hello")).await;
        assert!(matches!(result, Err(AIServiceError::NoApiKey)));
    }
}
