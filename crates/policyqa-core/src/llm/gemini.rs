use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::{CompletionService, LlmError};
use crate::config_file::{ConfigError, LlmConfig};

/// Google Gemini `generateContent` client (API key based).
pub struct GeminiClient {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Build a client from validated settings. Fails before any request is
    /// made when the API key is missing.
    pub fn new(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model.trim()
        );

        Ok(Self {
            api_key,
            model: config.model.trim().to_string(),
            endpoint,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Request body carrying `prompt` as a single user turn.
pub fn request_body(prompt: &str) -> Value {
    serde_json::json!({
        "contents": [{
            "parts": [{ "text": prompt }]
        }]
    })
}

/// Concatenated text parts of the first candidate.
pub fn response_text(body: &Value) -> Result<String, LlmError> {
    let candidate = body["candidates"]
        .as_array()
        .and_then(|arr| arr.first())
        .ok_or_else(|| {
            let reason = body["promptFeedback"]["blockReason"]
                .as_str()
                .map(|r| format!("prompt blocked: {}", r))
                .unwrap_or_else(|| "no candidates in response".to_string());
            LlmError::InvalidResponse(reason)
        })?;

    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate["finishReason"].as_str().unwrap_or("unknown");
        return Err(LlmError::InvalidResponse(format!(
            "candidate has no text (finish reason: {})",
            reason
        )));
    }
    Ok(text)
}

/// Map a non-success HTTP status to an [`LlmError`].
pub fn status_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    match status {
        401 | 403 => LlmError::Unauthorized { status, message },
        429 => LlmError::RateLimited(message),
        _ => LlmError::Api { status, message },
    }
}

impl CompletionService for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "sending completion request");

            let resp = self
                .client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body(prompt))
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let err = status_error(status.as_u16(), &body);
                tracing::warn!(model = %self.model, status = status.as_u16(), error = %err, "completion request failed");
                return Err(err);
            }

            let body: Value = resp.json().await?;
            let text = response_text(&body)?;
            tracing::debug!(model = %self.model, response_chars = text.len(), "completion received");
            Ok(text)
        })
    }
}
