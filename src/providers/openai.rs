//! OpenAI-compatible chat-completion provider
//!
//! Works against any endpoint speaking the `/chat/completions` dialect:
//! Together AI (the default), OpenRouter, or OpenAI native.
//!
//! Each call is a single attempt. A 429 from the hosted API surfaces as
//! [`ProviderError::RateLimit`] and the caller decides what to tell the user.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::LlmConfig;
use crate::providers::{LlmMessage, LlmProvider, LlmResponse, LlmToolCall, ProviderError};

/// OpenAI API request body format
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct OpenAiToolCall {
    id: String,
    /// Always "function"
    #[serde(rename = "type", default = "function_call_type")]
    call_type: String,
    function: OpenAiFunctionCall,
}

fn function_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct OpenAiFunctionCall {
    name: String,
    /// Arguments as JSON string
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
    error: Option<OpenAiError>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

/// Chat-completion client for OpenAI-compatible APIs
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    api_key: String,
    base_url: String,
    default_model: String,
    provider_name: &'static str,
    timeout_seconds: u64,
    client: Client,
}

impl OpenAiCompatibleProvider {
    /// Creates a provider, failing if the HTTP client cannot be built
    pub fn try_new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url: String = base_url.into();
        let provider_name = provider_name_for(&base_url);

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.into(),
            provider_name,
            timeout_seconds,
            client,
        })
    }

    /// Creates a provider from the `llm` section of the configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        Self::try_new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.model.clone(),
            config.timeout_seconds,
        )
    }

    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        tools: Vec<serde_json::Value>,
        model: &str,
    ) -> OpenAiRequest {
        let openai_messages: Vec<OpenAiMessage> = messages
            .into_iter()
            .map(|msg| OpenAiMessage {
                role: msg.role.as_str().to_string(),
                content: if msg.content.is_empty() {
                    None
                } else {
                    Some(msg.content)
                },
                tool_calls: None,
            })
            .collect();

        let tool_choice = if tools.is_empty() {
            None
        } else {
            Some("auto".to_string())
        };

        OpenAiRequest {
            model: model.to_string(),
            messages: openai_messages,
            tools,
            tool_choice,
        }
    }

    fn parse_response(&self, response: OpenAiResponse) -> Result<LlmResponse, ProviderError> {
        if let Some(error) = response.error {
            return Err(ProviderError::provider(
                error.message,
                error.code.or(error.error_type),
            ));
        }

        let choice =
            response.choices.into_iter().next().ok_or_else(|| {
                ProviderError::provider("No response choices returned", None::<&str>)
            })?;

        let message = choice.message;

        let tool_calls = message.tool_calls.map(|calls| {
            calls
                .into_iter()
                .map(|call| LlmToolCall {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect()
        });

        let mut llm_response = LlmResponse {
            content: message.content.unwrap_or_default(),
            tool_calls,
            prompt_tokens: None,
            completion_tokens: None,
        };

        if let Some(usage) = response.usage {
            llm_response.prompt_tokens = Some(usage.prompt_tokens);
            llm_response.completion_tokens = Some(usage.completion_tokens);
        }

        Ok(llm_response)
    }

    async fn send_request(&self, request: &OpenAiRequest) -> Result<OpenAiResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, provider = %self.provider_name, "Making chat completion request");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Request failed");
                if e.is_timeout() {
                    ProviderError::timeout(self.timeout_seconds)
                } else if e.is_connect() {
                    ProviderError::network(format!("Connection failed: {}", e))
                } else {
                    ProviderError::network(format!("Request failed: {}", e))
                }
            })?;

        let status = resp.status();
        debug!(status = %status, "Received response");

        match status {
            StatusCode::OK => resp.json::<OpenAiResponse>().await.map_err(|e| {
                ProviderError::serialization(format!("Failed to parse response: {}", e))
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let error_text = resp.text().await.unwrap_or_default();
                Err(ProviderError::auth(format!(
                    "Authentication failed ({}): {}",
                    status, error_text
                )))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let error_text = resp.text().await.unwrap_or_default();
                Err(ProviderError::rate_limit(error_text))
            }
            status if status.is_client_error() => {
                let error_text = resp.text().await.unwrap_or_default();
                Err(ProviderError::invalid_request(format!(
                    "Client error ({}): {}",
                    status, error_text
                )))
            }
            status => {
                let error_text = resp.text().await.unwrap_or_default();
                Err(ProviderError::provider(
                    format!("Unexpected status ({}): {}", status, error_text),
                    Some(status.as_u16().to_string()),
                ))
            }
        }
    }
}

/// Picks a short provider label from the endpoint host, for logs
fn provider_name_for(base_url: &str) -> &'static str {
    if base_url.contains("together.xyz") {
        "together"
    } else if base_url.contains("openrouter.ai") {
        "openrouter"
    } else if base_url.contains("api.openai.com") {
        "openai"
    } else {
        "openai-compatible"
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn chat(
        &self,
        messages: Vec<LlmMessage>,
        tools: Vec<serde_json::Value>,
        model: &str,
    ) -> Result<LlmResponse, ProviderError> {
        info!(
            model = model,
            provider = %self.provider_name,
            message_count = messages.len(),
            tool_count = tools.len(),
            "Sending chat request"
        );

        let request = self.build_request(messages, tools, model);
        let response = self.send_request(&request).await?;
        let llm_response = self.parse_response(response)?;

        debug!(
            content_length = llm_response.content.len(),
            has_tool_calls = llm_response.has_tool_calls(),
            prompt_tokens = ?llm_response.prompt_tokens,
            completion_tokens = ?llm_response.completion_tokens,
            total_tokens = ?llm_response.total_tokens(),
            "Received chat response"
        );

        Ok(llm_response)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn provider_name(&self) -> &'static str {
        self.provider_name
    }
}
