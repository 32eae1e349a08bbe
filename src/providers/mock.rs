//! Mock LLM provider for unit tests
//!
//! Responses are served from a FIFO queue; once the queue is empty the
//! fallback response is returned. Every request is recorded so tests can
//! assert on what the agent sent.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::providers::{LlmMessage, LlmProvider, LlmResponse, ProviderError};

/// A recorded `chat()` invocation
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<serde_json::Value>,
    pub model: String,
}

#[derive(Clone)]
pub struct MockLlmProvider {
    queue: Arc<Mutex<VecDeque<Result<LlmResponse, ProviderError>>>>,
    fallback: Arc<Mutex<LlmResponse>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    default_model: String,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(LlmResponse::new("Mock response"))),
            requests: Arc::new(Mutex::new(Vec::new())),
            default_model: "mock-model".to_string(),
        }
    }

    /// Queues a text response
    pub fn push_response(&self, content: impl Into<String>) {
        self.push(Ok(LlmResponse::new(content)));
    }

    /// Queues a raw result (response with tool calls, or an error)
    pub fn push(&self, result: Result<LlmResponse, ProviderError>) {
        self.queue.lock().unwrap().push_back(result);
    }

    /// Sets the response returned once the queue is drained
    pub fn set_fallback(&self, content: impl Into<String>) {
        *self.fallback.lock().unwrap() = LlmResponse::new(content);
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockLlmProvider {
    async fn chat(
        &self,
        messages: Vec<LlmMessage>,
        tools: Vec<serde_json::Value>,
        model: &str,
    ) -> Result<LlmResponse, ProviderError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages,
            tools,
            model: model.to_string(),
        });

        match self.queue.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(self.fallback.lock().unwrap().clone()),
        }
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_fallback() {
        let mock = MockLlmProvider::new();
        mock.push_response("first");
        mock.push(Err(ProviderError::network("down")));
        mock.set_fallback("later");

        let first = mock.chat(vec![LlmMessage::user("a")], vec![], "m").await;
        let second = mock.chat(vec![], vec![], "m").await;
        let third = mock.chat(vec![], vec![], "m").await;

        assert_eq!(first.unwrap().content, "first");
        assert!(second.is_err());
        assert_eq!(third.unwrap().content, "later");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_records_requests() {
        let mock = MockLlmProvider::new();
        mock.chat(vec![LlmMessage::user("hello")], vec![], "model-x")
            .await
            .unwrap();

        let last = mock.last_request().unwrap();
        assert_eq!(last.model, "model-x");
        assert_eq!(last.messages[0].content, "hello");
    }
}
