/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::scripted()` - Replays a fixed sequence of replies
 * - `MockProvider::responder()` - Computes each reply from the request
 * - `MockProvider::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{ExtractionRequest, Provider, StructuredExtractor};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Succeed with this response text
    Text(String),
    /// Fail with this error
    Error(ProviderError),
}

impl MockReply {
    /// Shorthand for a successful text reply
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Reply generator receiving the request and its zero-based call number
pub type Responder =
    dyn Fn(&ExtractionRequest, usize) -> Result<String, ProviderError> + Send + Sync;

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The response text
    pub text: String,
}

enum MockBehavior {
    Scripted(Mutex<VecDeque<MockReply>>),
    Responder(Box<Responder>),
    Failing(ProviderError),
}

/// Mock provider for testing extraction behavior
#[derive(Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: Arc<MockBehavior>,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<ExtractionRequest>>>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("request_count", &self.call_count())
            .finish()
    }
}

impl MockProvider {
    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior: Arc::new(behavior),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replay `replies` in order; further calls fail with `RequestFailed`
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self::with_behavior(MockBehavior::Scripted(Mutex::new(replies.into())))
    }

    /// Compute each reply from the request
    pub fn responder<F>(responder: F) -> Self
    where
        F: Fn(&ExtractionRequest, usize) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self::with_behavior(MockBehavior::Responder(Box::new(responder)))
    }

    /// Always fail with the given error
    pub fn failing(error: ProviderError) -> Self {
        Self::with_behavior(MockBehavior::Failing(error))
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every request received so far
    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.requests.lock().clone()
    }

    fn reply(&self, request: &ExtractionRequest) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        match self.behavior.as_ref() {
            MockBehavior::Scripted(queue) => match queue.lock().pop_front() {
                Some(MockReply::Text(text)) => Ok(text),
                Some(MockReply::Error(error)) => Err(error),
                None => Err(ProviderError::RequestFailed(format!(
                    "mock script exhausted at call #{}",
                    count + 1
                ))),
            },
            MockBehavior::Responder(responder) => responder(request, count),
            MockBehavior::Failing(error) => Err(error.clone()),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = ExtractionRequest;
    type Response = MockResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.reply(&request).map(|text| MockResponse { text })
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}

#[async_trait]
impl StructuredExtractor for MockProvider {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ProviderError> {
        self.reply(request)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
