//! Intent classification through the LLM
//!
//! The model is asked for exactly one JSON object fenced in triple backticks,
//! for example `{"intent": "crypto", "coin": "bitcoin"}` tagged as `json`,
//! which is decoded into an [`Intent`]. Anything else is a
//! [`ClassifyError::Parse`]; callers treat that as a general query.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::providers::{LlmMessage, LlmProvider, ProviderError};

const CLASSIFIER_SYSTEM_PROMPT: &str = "You are an AI assistant that helps classify user intents accurately to ensure smooth conversation flow.";

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?i:json)?[ \t]*\r?\n?(.*?)```").expect("fenced block pattern is valid")
});

/// What the user wants from this turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// A cryptocurrency question, with the coin when the model named one
    Crypto { coin: Option<String> },
    General,
    /// A request to switch language; replies stay in English regardless
    LanguageChange { language: Option<String> },
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Crypto { .. } => "crypto",
            Intent::General => "general",
            Intent::LanguageChange { .. } => "language_change",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum IntentLabel {
    Crypto,
    General,
    LanguageChange,
}

#[derive(Debug, Deserialize)]
struct IntentPayload {
    intent: IntentLabel,
    #[serde(default)]
    coin: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<IntentPayload> for Intent {
    fn from(payload: IntentPayload) -> Self {
        match payload.intent {
            IntentLabel::Crypto => Intent::Crypto {
                coin: non_blank(payload.coin),
            },
            IntentLabel::General => Intent::General,
            IntentLabel::LanguageChange => Intent::LanguageChange {
                language: non_blank(payload.language),
            },
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("Failed to parse intent from model reply: {message}")]
    Parse { message: String, raw_reply: String },

    #[error("Intent classification request failed: {0}")]
    Provider(#[from] ProviderError),
}

impl ClassifyError {
    fn parse(message: impl Into<String>, raw_reply: &str) -> Self {
        Self::Parse {
            message: message.into(),
            raw_reply: raw_reply.to_string(),
        }
    }
}

/// Extracts and decodes the single fenced JSON block in a model reply
///
/// Zero blocks, more than one block, invalid JSON, an unknown label or a
/// non-string entity are all parse errors.
pub fn parse_intent(reply: &str) -> Result<Intent, ClassifyError> {
    let mut blocks = FENCED_BLOCK.captures_iter(reply);

    let block = match (blocks.next(), blocks.next()) {
        (Some(only), None) => only,
        (None, _) => return Err(ClassifyError::parse("no fenced JSON block found", reply)),
        (Some(_), Some(_)) => {
            return Err(ClassifyError::parse("multiple fenced blocks found", reply));
        }
    };

    let json = block.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    let payload: IntentPayload = serde_json::from_str(json)
        .map_err(|e| ClassifyError::parse(format!("invalid intent JSON: {}", e), reply))?;

    Ok(payload.into())
}

fn build_prompt(user_message: &str) -> Vec<LlmMessage> {
    vec![
        LlmMessage::system(CLASSIFIER_SYSTEM_PROMPT),
        LlmMessage::user(format!(
            "Classify this query: '{user_message}'. Reply with a JSON object containing 'intent' as either 'crypto', 'general', or 'language_change'. \
             If the intent is 'crypto' and a specific coin is mentioned, add 'coin' with its CoinGecko id in lowercase (for example 'bitcoin' or 'ethereum'). \
             If the intent is 'language_change', add 'language' with the language the user asked for. \
             Wrap the JSON response within triple backticks (```json ... ```). Make sure to provide a clear and definitive answer."
        )),
    ]
}

pub struct IntentClassifier {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Classifies one user message with a single LLM call, never retried
    pub async fn classify(&self, user_message: &str) -> Result<Intent, ClassifyError> {
        let response = self
            .provider
            .chat(build_prompt(user_message), vec![], &self.model)
            .await?;

        debug!(reply = %response.content, "Classifier reply");
        let intent = parse_intent(&response.content)?;
        debug!(intent = intent.label(), "Classified intent");
        Ok(intent)
    }
}
