//! LLM provider module for crypto-agent
//!
//! Defines the provider trait and the message types exchanged with a hosted
//! chat-completion API. The only production implementation is the
//! OpenAI-compatible client in [`openai`], which covers Together AI,
//! OpenRouter and OpenAI itself.
//!
//! # Example
//!
//! ```no_run
//! use crypto_agent::providers::{LlmMessage, LlmProvider, LlmRole};
//!
//! async fn example(provider: &dyn LlmProvider) {
//!     let messages = vec![
//!         LlmMessage::new(LlmRole::System, "You are a helpful assistant"),
//!         LlmMessage::new(LlmRole::User, "Hello!"),
//!     ];
//!
//!     let response = provider
//!         .chat(messages, vec![], &provider.default_model())
//!         .await
//!         .unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
#[cfg(test)]
pub mod mock;
pub mod openai;

pub use error::ProviderError;
pub use openai::OpenAiCompatibleProvider;

/// A message in the conversation sent to the LLM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmMessage {
    /// Role of the message sender
    pub role: LlmRole,
    /// Content of the message
    pub content: String,
}

impl LlmMessage {
    /// Creates a new message with the specified role and content
    pub fn new(role: LlmRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(LlmRole::System, content)
    }

    /// Creates a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(LlmRole::User, content)
    }

    /// Creates an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(LlmRole::Assistant, content)
    }
}

/// Role of a message sender in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant response
    Assistant,
}

impl LlmRole {
    /// Returns the string representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::System => "system",
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for LlmRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tool call requested by the LLM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to execute
    pub name: String,
    /// JSON-encoded arguments for the tool
    pub arguments: String,
}

impl LlmToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parses the arguments as JSON
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }
}

/// Response from the LLM provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    /// Content of the assistant's response
    pub content: String,
    /// Optional tool calls requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<LlmToolCall>>,
    /// Number of tokens in the prompt (if provided by provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    /// Number of tokens in the completion (if provided by provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
}

impl LlmResponse {
    /// Creates a new response with just content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: None,
            prompt_tokens: None,
            completion_tokens: None,
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<LlmToolCall>) -> Self {
        self.tool_calls = Some(tool_calls);
        self
    }

    /// Returns true if this response contains tool calls
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|c| !c.is_empty())
            .unwrap_or(false)
    }

    /// Returns the total token count if available
    pub fn total_tokens(&self) -> Option<u32> {
        match (self.prompt_tokens, self.completion_tokens) {
            (Some(p), Some(c)) => Some(p + c),
            _ => None,
        }
    }
}

/// Definition of a function tool offered to the LLM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for tool parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Converts to OpenAI function format
    pub fn to_openai_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Trait for chat-completion providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat request with conversation history and available tools
    ///
    /// `tools` are raw JSON values in OpenAI function format, see
    /// [`ToolDefinition::to_openai_format`].
    async fn chat(
        &self,
        messages: Vec<LlmMessage>,
        tools: Vec<serde_json::Value>,
        model: &str,
    ) -> Result<LlmResponse, ProviderError>;

    /// Returns the default model for this provider
    fn default_model(&self) -> String;

    /// Returns the provider name, used for logging
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_role_as_str() {
        assert_eq!(LlmRole::System.as_str(), "system");
        assert_eq!(LlmRole::User.as_str(), "user");
        assert_eq!(LlmRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_llm_role_display() {
        assert_eq!(format!("{}", LlmRole::System), "system");
        assert_eq!(format!("{}", LlmRole::User), "user");
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(LlmMessage::user("hi").role, LlmRole::User);
        assert_eq!(LlmMessage::assistant("hi").role, LlmRole::Assistant);
        assert_eq!(LlmMessage::system("hi").content, "hi");
    }

    #[test]
    fn test_llm_tool_call_parse_arguments() {
        let tool_call = LlmToolCall::new(
            "call_1",
            "get_crypto_price",
            r#"{"crypto_symbol": "ethereum"}"#,
        );

        #[derive(serde::Deserialize)]
        struct Args {
            crypto_symbol: String,
        }

        let args: Args = tool_call.parse_arguments().unwrap();
        assert_eq!(args.crypto_symbol, "ethereum");
    }

    #[test]
    fn test_llm_response_tool_calls_and_tokens() {
        let response = LlmResponse::new("Hello!");
        assert!(!response.has_tool_calls());
        assert!(response.total_tokens().is_none());

        let response = LlmResponse::new("")
            .with_tool_calls(vec![LlmToolCall::new("call_1", "t", "{}")]);
        assert!(response.has_tool_calls());

        let response = LlmResponse {
            prompt_tokens: Some(10),
            completion_tokens: Some(5),
            ..LlmResponse::new("ok")
        };
        assert_eq!(response.total_tokens(), Some(15));

        let empty = LlmResponse::new("").with_tool_calls(vec![]);
        assert!(!empty.has_tool_calls());
    }

    #[test]
    fn test_tool_definition_openai_format() {
        let params = serde_json::json!({
            "type": "object",
            "properties": {
                "crypto_symbol": {"type": "string"}
            }
        });

        let tool = ToolDefinition::new("get_crypto_price", "Fetch a price", params.clone());
        let openai_format = tool.to_openai_format();

        assert_eq!(openai_format["type"], "function");
        assert_eq!(openai_format["function"]["name"], "get_crypto_price");
        assert_eq!(openai_format["function"]["parameters"], params);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&LlmRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
