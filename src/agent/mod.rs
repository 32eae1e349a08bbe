pub mod agent_loop;
pub mod conversation;
pub mod intent;
pub mod replies;

pub use agent_loop::{CryptoAgent, is_exit_command};
pub use conversation::{Conversation, ConversationState, Message, Role};
pub use intent::{ClassifyError, Intent, IntentClassifier, parse_intent};
