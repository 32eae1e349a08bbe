use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::agent::conversation::Conversation;
use crate::agent::intent::{ClassifyError, Intent, IntentClassifier};
use crate::agent::replies;
use crate::pricing::{PriceFetcher, resolve_coin_id};
use crate::providers::{LlmProvider, ToolDefinition};

/// Name of the price tool offered to the model when no coin was extracted
pub const PRICE_TOOL_NAME: &str = "get_crypto_price";

/// Words that end the session, compared case-insensitively
pub const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

const KNOWN_LANGUAGES: [&str; 16] = [
    "English",
    "French",
    "Spanish",
    "German",
    "Italian",
    "Portuguese",
    "Dutch",
    "Russian",
    "Chinese",
    "Japanese",
    "Korean",
    "Arabic",
    "Hindi",
    "Turkish",
    "Polish",
    "Swedish",
];

#[derive(Debug, Deserialize)]
struct PriceToolArgs {
    crypto_symbol: String,
}

pub fn price_tool_definition() -> ToolDefinition {
    ToolDefinition::new(
        PRICE_TOOL_NAME,
        "Fetches the current price of a specified cryptocurrency in USD",
        json!({
            "type": "object",
            "properties": {
                "crypto_symbol": {
                    "type": "string",
                    "description": "The cryptocurrency name, e.g., ethereum"
                }
            },
            "required": ["crypto_symbol"]
        }),
    )
}

pub fn is_exit_command(input: &str) -> bool {
    let trimmed = input.trim();
    EXIT_COMMANDS
        .iter()
        .any(|cmd| trimmed.eq_ignore_ascii_case(cmd))
}

/// Finds a known language name mentioned in the message
pub fn detect_language(message: &str) -> Option<String> {
    message
        .split(|c: char| !c.is_alphabetic())
        .find_map(|word| {
            KNOWN_LANGUAGES
                .iter()
                .find(|lang| lang.eq_ignore_ascii_case(word))
        })
        .map(|lang| lang.to_string())
}

/// Drives one conversation: classify, dispatch, respond
///
/// Owns every piece of mutable state (history, cache, rate window), so a
/// turn borrows the agent mutably and nothing needs locking.
pub struct CryptoAgent {
    provider: Arc<dyn LlmProvider>,
    model: String,
    classifier: IntentClassifier,
    fetcher: PriceFetcher,
    conversation: Conversation,
}

impl CryptoAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, fetcher: PriceFetcher) -> Self {
        let model = model.into();
        Self {
            classifier: IntentClassifier::new(Arc::clone(&provider), model.clone()),
            provider,
            model,
            fetcher,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_active(&self) -> bool {
        self.conversation.is_active()
    }

    /// Ends the session; later calls to [`Self::process_message`] are refused
    pub fn finish(&mut self) {
        info!(messages = self.conversation.len(), "Conversation finished");
        self.conversation.finish();
    }

    /// Runs one turn and returns the assistant reply
    ///
    /// Every recoverable failure becomes a user-facing reply; this never errors.
    pub async fn process_message(&mut self, user_message: &str) -> String {
        if !self.conversation.is_active() {
            return replies::GOODBYE.to_string();
        }

        self.conversation.add_user_message(user_message);

        let intent = match self.classifier.classify(user_message).await {
            Ok(intent) => intent,
            Err(ClassifyError::Parse { message, raw_reply }) => {
                warn!(
                    error = %message,
                    raw_reply = %raw_reply,
                    "Unparseable intent, treating as general query"
                );
                Intent::General
            }
            Err(ClassifyError::Provider(e)) => {
                warn!(error = %e, "Intent classification request failed");
                let reply = replies::GENERIC_APOLOGY.to_string();
                self.conversation.add_assistant_message(reply.clone());
                return reply;
            }
        };
        info!(intent = intent.label(), "Dispatching turn");

        let reply = match intent {
            Intent::Crypto { coin: Some(coin) } => {
                self.ensure_crypto_intro();
                self.price_reply(&coin).await
            }
            Intent::Crypto { coin: None } => {
                self.ensure_crypto_intro();
                self.crypto_tool_reply().await
            }
            Intent::LanguageChange { language } => self.language_change_reply(language, user_message),
            Intent::General => self.general_reply().await,
        };

        self.conversation.add_assistant_message(reply.clone());
        reply
    }

    fn ensure_crypto_intro(&mut self) {
        if !self.conversation.has_assistant_message() {
            self.conversation.add_assistant_message(replies::CRYPTO_INTRO);
        }
    }

    async fn price_reply(&mut self, coin: &str) -> String {
        let coin_id = resolve_coin_id(coin);
        match self.fetcher.fetch_price(&coin_id).await {
            Ok(price) => replies::price_reply(&coin_id, price),
            Err(e) => {
                warn!(coin = %coin_id, error = %e, "Price lookup failed");
                replies::price_error_reply(&coin_id, &e)
            }
        }
    }

    /// Lets the model pick the coin through the price tool
    async fn crypto_tool_reply(&mut self) -> String {
        let tools = vec![price_tool_definition().to_openai_format()];
        let response = match self
            .provider
            .chat(self.conversation.to_llm_messages(), tools, &self.model)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Crypto query request failed");
                return replies::GENERIC_APOLOGY.to_string();
            }
        };

        let Some(tool_calls) = response.tool_calls.filter(|calls| !calls.is_empty()) else {
            return non_empty_or_apology(response.content);
        };

        let mut answers = Vec::new();
        for call in tool_calls.iter().filter(|call| call.name == PRICE_TOOL_NAME) {
            match call.parse_arguments::<PriceToolArgs>() {
                Ok(args) => answers.push(self.price_reply(&args.crypto_symbol).await),
                Err(e) => warn!(error = %e, arguments = %call.arguments, "Bad price tool arguments"),
            }
        }

        if answers.is_empty() {
            debug!(count = tool_calls.len(), "No usable tool call in crypto response");
            return replies::GENERIC_APOLOGY.to_string();
        }
        answers.join("\n")
    }

    fn language_change_reply(&mut self, language: Option<String>, user_message: &str) -> String {
        match language.or_else(|| detect_language(user_message)) {
            Some(language) => {
                info!(language = %language, "Language preference updated");
                self.conversation.set_language_preference(language);
            }
            None => debug!("Language change requested without a recognisable language"),
        }
        replies::LANGUAGE_ACK.to_string()
    }

    async fn general_reply(&mut self) -> String {
        match self
            .provider
            .chat(self.conversation.to_llm_messages(), vec![], &self.model)
            .await
        {
            Ok(response) => non_empty_or_apology(response.content),
            Err(e) => {
                warn!(error = %e, "General query request failed");
                replies::GENERIC_APOLOGY.to_string()
            }
        }
    }
}

fn non_empty_or_apology(content: String) -> String {
    if content.trim().is_empty() {
        replies::GENERIC_APOLOGY.to_string()
    } else {
        content
    }
}
