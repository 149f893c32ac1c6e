//! Client for OpenAI-compatible chat completion endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::collab::{CompletionOptions, TextCompletion};
use crate::error::CompletionError;

pub struct OpenAiCompletion {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompletion {
    /// `api_url` is the API base, e.g. `https://api.openai.com/v1`.
    pub fn new(
        api_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .user_agent("ChessArena/0.1")
            .build()
            .map_err(|e| CompletionError::Provider(format!("Client build error: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": options.max_output_tokens,
            "temperature": options.temperature,
        });

        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(options.timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.map_err(request_error)?;
        if !resp.status().is_success() {
            return Err(CompletionError::Provider(format!("HTTP {}", resp.status())));
        }

        let value: Value = resp.json().await.map_err(request_error)?;
        message_content(&value)
            .ok_or_else(|| CompletionError::Provider("Response has no message content".into()))
    }
}

fn request_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Provider(format!("Request error: {e}"))
    }
}

/// Text of the first choice in a chat completion response.
pub fn message_content(response: &Value) -> Option<String> {
    response
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_content() {
        let response = json!({
            "id": "cmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "{\"pick\": 2}" } }
            ]
        });
        assert_eq!(message_content(&response).as_deref(), Some("{\"pick\": 2}"));
    }

    #[test]
    fn test_message_content_missing() {
        assert!(message_content(&json!({ "choices": [] })).is_none());
        assert!(message_content(&json!({ "error": { "message": "rate limited" } })).is_none());
    }

    #[test]
    fn test_endpoint_joins_base() {
        let client = OpenAiCompletion::new("http://localhost:8080/v1/", None, "local").unwrap();
        assert_eq!(client.endpoint, "http://localhost:8080/v1/chat/completions");
    }
}
