//! Anthropic Messages API client used for opinion rating.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::llm::AnthropicConfig;
use crate::port::outbound::llm::Llm;

/// Default Messages API endpoint.
const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// API version header value.
const API_VERSION: &str = "2023-06-01";

/// Anthropic Claude API client.
#[derive(Debug)]
pub struct Anthropic {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: usize,
    temperature: f64,
    system: Option<String>,
}

impl Anthropic {
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: usize,
        temperature: f64,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: API_URL.to_string(),
            model: model.into(),
            max_tokens,
            temperature,
            system: None,
        }
    }

    /// Build a client from config, reading `ANTHROPIC_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a config error if the environment variable is not set.
    pub fn from_config(config: &AnthropicConfig) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            Error::Config(ConfigError::MissingField {
                field: "ANTHROPIC_API_KEY",
            })
        })?;
        let mut client = Self::new(api_key, &config.model, config.max_tokens, config.temperature);
        if let Some(url) = &config.base_url {
            client.endpoint = url.clone();
        }
        Ok(client)
    }

    /// Attach a system prompt sent with every request.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    fn request<'a>(&'a self, prompt: &'a str) -> Request<'a> {
        Request {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: self.system.as_deref(),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Llm for Anthropic {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&self.request(prompt))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Connection(e.to_string()))?
            .json::<Response>()
            .await?;

        Ok(response.content.into_iter().map(|c| c.text).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_system_prompt_when_set() {
        let client = Anthropic::new("key", "claude-haiku-4-5", 512, 0.0).with_system("grade");
        let json = serde_json::to_value(client.request("rate these")).unwrap();

        assert_eq!(json["model"], "claude-haiku-4-5");
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["system"], "grade");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "rate these");
    }

    #[test]
    fn request_omits_missing_system_prompt() {
        let client = Anthropic::new("key", "m", 16, 0.2);
        let json = serde_json::to_value(client.request("hi")).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn response_joins_text_blocks() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "[80, "},
                {"type": "text", "text": "45]"}
            ],
            "id": "msg_1",
            "model": "claude-haiku-4-5",
            "role": "assistant",
            "stop_reason": "end_turn",
            "type": "message"
        }"#;

        let response: Response = serde_json::from_str(json).unwrap();
        let text: String = response.content.into_iter().map(|c| c.text).collect();
        assert_eq!(text, "[80, 45]");
    }

    #[test]
    fn response_without_content_is_rejected() {
        let result: std::result::Result<Response, _> = serde_json::from_str(r#"{"id": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn config_base_url_overrides_endpoint() {
        std::env::set_var("ANTHROPIC_API_KEY", "test-key");
        let config = AnthropicConfig {
            base_url: Some("http://localhost:9999/v1/messages".into()),
            ..AnthropicConfig::default()
        };
        let client = Anthropic::from_config(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9999/v1/messages");
        assert_eq!(client.model, config.model);
        assert_eq!(client.name(), "anthropic");
    }
}

/// Run with: `cargo test --features integration-tests -- --ignored`
#[cfg(all(test, feature = "integration-tests"))]
mod integration_tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    #[ignore = "requires ANTHROPIC_API_KEY and network access"]
    async fn completes_a_json_array_prompt() {
        let Ok(client) = Anthropic::from_config(&AnthropicConfig::default()) else {
            return;
        };

        let result = tokio::time::timeout(
            Duration::from_secs(30),
            client.complete("Reply with exactly this JSON and nothing else: [1, 2, 3]"),
        )
        .await
        .expect("request timed out")
        .expect("API call failed");

        assert!(result.contains("[1, 2, 3]") || result.contains("[1,2,3]"));
    }
}
