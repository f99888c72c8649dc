//! Mock completion service for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{CompletionService, LlmError};

/// A configurable mock response for [`MockLlm`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this text as the model output.
    Text(String),
    /// Simulate a 429 rate-limit response.
    RateLimited,
    /// Simulate a rejected API key.
    Unauthorized,
    /// Simulate a generic API error.
    Error(String),
}

impl MockResponse {
    pub fn text(s: impl Into<String>) -> Self {
        MockResponse::Text(s.into())
    }
}

/// A hand-rolled mock implementing [`CompletionService`] for tests.
///
/// Supports:
/// - A fixed response (used for every call), **or**
/// - A sequence of responses (one per call, repeating the last if exhausted).
/// - Recording of every prompt received via [`prompts()`](MockLlm::prompts).
pub struct MockLlm {
    /// Pending responses, stored reversed so `pop()` yields the next one.
    responses: Mutex<Vec<MockResponse>>,
    /// Used once the sequence is exhausted.
    fallback: MockResponse,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl MockLlm {
    /// Create a mock that always returns `response`.
    pub fn new(response: MockResponse) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback: response,
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(mut responses: Vec<MockResponse>) -> Self {
        assert!(
            !responses.is_empty(),
            "sequence must have at least one response"
        );
        responses.reverse();
        let fallback = responses[0].clone();
        Self {
            responses: Mutex::new(responses),
            fallback,
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `complete()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_response(&self) -> MockResponse {
        let mut seq = self.responses.lock().unwrap();
        seq.pop().unwrap_or_else(|| self.fallback.clone())
    }
}

impl CompletionService for MockLlm {
    fn name(&self) -> &str {
        "mock"
    }

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let response = self.next_response();

        Box::pin(async move {
            match response {
                MockResponse::Text(text) => Ok(text),
                MockResponse::RateLimited => {
                    Err(LlmError::RateLimited("Resource has been exhausted".into()))
                }
                MockResponse::Unauthorized => Err(LlmError::Unauthorized {
                    status: 403,
                    message: "API key not valid".into(),
                }),
                MockResponse::Error(message) => Err(LlmError::Api {
                    status: 500,
                    message,
                }),
            }
        })
    }
}
