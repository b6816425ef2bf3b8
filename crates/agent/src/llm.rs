use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use stocktalk_core::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm response was malformed: {0}")]
    MalformedResponse(String),
    #[error("scripted llm client ran out of responses")]
    ScriptExhausted,
}

/// Opaque text-completion oracle. One prompt in, free-form text out; the
/// callers own all parsing and validation.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Client for OpenAI-compatible `chat/completions` endpoints (Groq, OpenAI,
/// Ollama). Single blocking call per prompt, timeout from config, no
/// retries.
pub struct HttpLlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| config.provider.default_base_url().to_string());

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut request = self.http.post(format!("{}/chat/completions", self.base_url));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|error| LlmError::MalformedResponse(error.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("response carried no choices".to_string()))
    }
}

/// Deterministic client that replays queued responses in order. Used by
/// handler, orchestrator, and surface tests; never by production wiring.
#[derive(Default)]
pub struct ScriptedLlmClient {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedLlmClient {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|queue| queue.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.responses
            .lock()
            .map_err(|_| LlmError::MalformedResponse("scripted client poisoned".to_string()))?
            .pop_front()
            .ok_or(LlmError::ScriptExhausted)
    }
}

#[cfg(test)]
mod tests {
    use stocktalk_core::config::{LlmConfig, LlmProvider};

    use super::{HttpLlmClient, LlmClient, LlmError, ScriptedLlmClient};

    #[tokio::test]
    async fn scripted_client_replays_in_order_then_errors() {
        let client = ScriptedLlmClient::new(["first", "second"]);
        assert_eq!(client.complete("a").await.expect("first"), "first");
        assert_eq!(client.complete("b").await.expect("second"), "second");
        assert!(matches!(client.complete("c").await, Err(LlmError::ScriptExhausted)));
    }

    #[test]
    fn http_client_falls_back_to_provider_base_url() {
        let config = LlmConfig {
            provider: LlmProvider::Groq,
            api_key: Some("gsk-test".to_string().into()),
            base_url: None,
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.0,
            timeout_secs: 30,
        };

        let client = HttpLlmClient::from_config(&config).expect("build client");
        assert_eq!(client.base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn http_client_strips_trailing_slash_from_base_url() {
        let config = LlmConfig {
            provider: LlmProvider::Ollama,
            api_key: None,
            base_url: Some("http://localhost:11434/v1/".to_string()),
            model: "llama3.1".to_string(),
            temperature: 0.0,
            timeout_secs: 30,
        };

        let client = HttpLlmClient::from_config(&config).expect("build client");
        assert_eq!(client.base_url, "http://localhost:11434/v1");
    }
}
