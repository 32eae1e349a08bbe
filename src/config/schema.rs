use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::loader::ConfigError;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.together.xyz/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo";
pub const DEFAULT_PRICING_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub llm_base_url: String,

    pub model: String,

    pub pricing_url: String,

    /// Applies to both the LLM and the pricing client
    pub request_timeout_seconds: u64,

    pub cache_ttl_seconds: u64,

    pub rate_limit_max_calls: usize,

    pub rate_limit_window_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            pricing_url: DEFAULT_PRICING_URL.to_string(),
            request_timeout_seconds: 30,
            cache_ttl_seconds: 60,
            rate_limit_max_calls: 5,
            rate_limit_window_seconds: 60,
        }
    }
}

/// Resolved settings for the chat-completion client
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

/// Loggable view of the configuration; never carries the key itself
#[derive(Debug, Clone, PartialEq)]
pub struct SafeConfigSummary {
    pub api_key_configured: bool,
    pub model: String,
    pub llm_base_url: String,
    pub pricing_url: String,
}

impl Config {
    /// Checks the configuration is usable, failing fast on a missing key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(ConfigError::MissingApiKey);
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model cannot be empty".to_string()));
        }
        if self.rate_limit_max_calls == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit_max_calls must be at least 1".to_string(),
            ));
        }
        if self.rate_limit_window_seconds == 0 || self.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "rate limit window and request timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn llm_config(&self) -> Result<LlmConfig, ConfigError> {
        self.validate()?;
        Ok(LlmConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            base_url: self.llm_base_url.clone(),
            model: self.model.clone(),
            timeout_seconds: self.request_timeout_seconds,
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn get_safe_summary(&self) -> SafeConfigSummary {
        SafeConfigSummary {
            api_key_configured: self
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty()),
            model: self.model.clone(),
            llm_base_url: self.llm_base_url.clone(),
            pricing_url: self.pricing_url.clone(),
        }
    }
}
