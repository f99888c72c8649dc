//! The language-model boundary: an opaque text-completion service.

pub mod gemini;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use gemini::GeminiClient;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API key rejected (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("rate limited (429): {0}")]
    RateLimited(String),
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A service that turns a prompt into free text.
pub trait CompletionService: Send + Sync {
    /// Short provider/model description for logs.
    fn name(&self) -> &str;

    /// Send `prompt` and return the model's text response.
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;
}

impl<T: CompletionService + ?Sized> CompletionService for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        (**self).complete(prompt)
    }
}
