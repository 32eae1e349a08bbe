//! Error types for LLM provider operations

use thiserror::Error;

/// Errors that can occur when talking to a chat-completion API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Connection issues, DNS failures, broken transfers
    #[error("Network error: {message}")]
    Network { message: String },

    /// Invalid API key or unauthorized access
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// The hosted API rejected the call with 429
    #[error("Rate limit exceeded: {message}")]
    RateLimit { message: String },

    /// Bad parameters or malformed input (other 4xx)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Request timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Errors reported by the LLM service itself (5xx, error payloads)
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        code: Option<String>,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ProviderError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    pub fn provider(message: impl Into<String>, code: Option<impl Into<String>>) -> Self {
        Self::Provider {
            message: message.into(),
            code: code.map(|c| c.into()),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert!(matches!(ProviderError::auth("bad key"), ProviderError::Auth { .. }));
        assert!(matches!(
            ProviderError::rate_limit("slow down"),
            ProviderError::RateLimit { .. }
        ));
    }

    #[test]
    fn test_provider_error_with_code() {
        let err = ProviderError::provider("Server error", Some("500"));
        assert!(matches!(err, ProviderError::Provider { code: Some(_), .. }));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let provider_err: ProviderError = json_err.into();
        assert!(matches!(provider_err, ProviderError::Serialization { .. }));
    }

    #[test]
    fn test_error_display_messages() {
        let err = ProviderError::network("Connection refused");
        assert!(err.to_string().contains("Network error"));
        assert!(err.to_string().contains("Connection refused"));

        let err = ProviderError::timeout(30);
        assert_eq!(err.to_string(), "Request timeout after 30 seconds");
    }
}
