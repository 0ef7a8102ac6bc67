//! Chat-completions client for an OpenAI-compatible proxy.

use reqwest::Client;
use serde_json::{Value, json};
use spamslam_core::{AiGateway, GatewayResult};
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::http::read_json;

/// Default proxy base URL.
pub const DEFAULT_PROXY_URL: &str = "https://openai-proxy.misty-hill-5aa9.workers.dev";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// AI backend speaking the chat-completions protocol.
#[derive(Debug, Clone)]
pub struct OpenAiProxy {
    http_client: Client,
    endpoint: Url,
    model: String,
    temperature: f64,
}

impl OpenAiProxy {
    /// Creates a client for the proxy at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http_client: Client::new(),
            endpoint: base.join("v1/chat/completions")?,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// The completions endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends a single-turn prompt and returns the reply text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;
        let reply: Value = read_json(response).await?;

        debug!(model = %self.model, "Completion received");
        Ok(extract_reply(&reply))
    }
}

/// Pulls the reply text from a completions response.
///
/// Uses `choices[0].message.content`, then `choices[0].text`, and
/// otherwise returns the whole body pretty-printed.
#[must_use]
pub fn extract_reply(body: &Value) -> String {
    let choice = body.pointer("/choices/0");
    choice
        .and_then(|c| c.pointer("/message/content"))
        .and_then(Value::as_str)
        .or_else(|| choice.and_then(|c| c.get("text")).and_then(Value::as_str))
        .map_or_else(
            || serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string()),
            str::to_string,
        )
}

impl AiGateway for OpenAiProxy {
    async fn generate(&self, prompt: &str) -> GatewayResult<String> {
        Ok(self.complete(prompt).await?)
    }
}
