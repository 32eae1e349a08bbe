use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::providers::{LlmMessage, LlmRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn to_llm_message(&self) -> LlmMessage {
        let role = match self.role {
            Role::User => LlmRole::User,
            Role::Assistant => LlmRole::Assistant,
        };
        LlmMessage::new(role, self.content.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Active,
    /// Terminal; the user asked to leave
    Finished,
}

/// One user's chat session for the lifetime of the process
///
/// History is append-only and never trimmed.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    language_preference: Option<String>,
    state: ConversationState,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            language_preference: None,
            state: ConversationState::Active,
        }
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::User, content));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::Assistant, content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_assistant_message(&self) -> bool {
        self.messages.iter().any(Message::is_assistant)
    }

    /// Full history in the provider's message format
    pub fn to_llm_messages(&self) -> Vec<LlmMessage> {
        self.messages.iter().map(Message::to_llm_message).collect()
    }

    /// The input language the user asked for; output stays English
    pub fn language_preference(&self) -> Option<&str> {
        self.language_preference.as_deref()
    }

    pub fn set_language_preference(&mut self, language: impl Into<String>) {
        self.language_preference = Some(language.into());
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ConversationState::Active
    }

    pub fn finish(&mut self) {
        self.state = ConversationState::Finished;
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
