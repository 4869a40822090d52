//! HTTP client for OpenAI-compatible generation endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::LlmError;

/// A message in a conversation with the generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender ("system", "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request for text generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier. Empty string means the client's default model.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Maximum number of output tokens (the retry budget knob).
    pub max_tokens: Option<u32>,
    /// Ask the endpoint for a JSON object response.
    pub json_output: bool,
}

impl GenerationRequest {
    /// Create a new generation request with default parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            json_output: false,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token budget for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Request structured JSON output.
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Token usage statistics for a generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from a generation request.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Model that produced the response.
    pub model: String,
    /// Generated text.
    pub content: String,
    /// Token usage statistics.
    pub usage: Usage,
}

/// Trait for generation services the pipeline can call.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct LiteLlmClient {
    api_base: String,
    api_key: Option<String>,
    default_model: String,
    http_client: Client,
}

impl LiteLlmClient {
    /// Create a new client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL of the API (e.g. "https://openrouter.ai/api/v1")
    /// * `api_key` - Optional API key for authentication
    /// * `default_model` - Model used when a request leaves the model empty
    pub fn new(api_base: String, api_key: Option<String>, default_model: String) -> Self {
        Self {
            api_base,
            api_key,
            default_model,
            http_client: Client::builder()
                .timeout(Duration::from_secs(180))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Create a new client from environment variables.
    ///
    /// Reads:
    /// - `IDEAFORGE_API_BASE`: base URL for the API (required)
    /// - `IDEAFORGE_API_KEY`: API key (optional)
    /// - `IDEAFORGE_MODEL`: default model (defaults to "anthropic/claude-sonnet-4.5")
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiBase` if `IDEAFORGE_API_BASE` is not set.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_base = env::var("IDEAFORGE_API_BASE").map_err(|_| LlmError::MissingApiBase)?;
        let api_key = env::var("IDEAFORGE_API_KEY").ok();
        let default_model = env::var("IDEAFORGE_MODEL")
            .unwrap_or_else(|_| "anthropic/claude-sonnet-4.5".to_string());

        Ok(Self::new(api_base, api_key, default_model))
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Internal request structure for the OpenAI-compatible API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Internal response structure from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: String,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl LlmProvider for LiteLlmClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let api_request = ApiRequest {
            model,
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_output.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let url = format!("{}/chat/completions", self.api_base);

        let mut http_request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let http_response = http_request
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                return Err(LlmError::ApiError {
                    code: status.as_u16(),
                    message: error_response.error.message,
                });
            }

            return Err(LlmError::ApiError {
                code: status.as_u16(),
                message: error_text,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        Ok(GenerationResponse {
            model: api_response.model,
            content,
            usage: api_response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::system("be helpful");
        assert_eq!(msg.role, "system");
        assert_eq!(msg.content, "be helpful");

        let msg = Message::user("hello");
        assert_eq!(msg.role, "user");
    }

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("test-model", vec![Message::user("hi")])
            .with_temperature(0.9)
            .with_max_tokens(4096)
            .with_json_output();

        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, Some(0.9));
        assert_eq!(request.max_tokens, Some(4096));
        assert!(request.json_output);
    }

    #[test]
    fn test_api_request_skips_absent_fields() {
        let api_request = ApiRequest {
            model: "m".to_string(),
            messages: vec![Message::user("hi")],
            temperature: None,
            max_tokens: None,
            response_format: None,
        };
        let json = serde_json::to_string(&api_request).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("response_format"));
    }

    #[test]
    fn test_api_request_json_output_format() {
        let api_request = ApiRequest {
            model: "m".to_string(),
            messages: vec![Message::user("hi")],
            temperature: Some(0.3),
            max_tokens: Some(8192),
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };
        let json = serde_json::to_string(&api_request).unwrap();
        assert!(json.contains("json_object"));
        assert!(json.contains("8192"));
    }

    #[test]
    fn test_client_defaults() {
        let client = LiteLlmClient::new(
            "http://localhost:4000".to_string(),
            None,
            "test-model".to_string(),
        );
        assert_eq!(client.api_base(), "http://localhost:4000");
        assert_eq!(client.default_model(), "test-model");
    }
}
