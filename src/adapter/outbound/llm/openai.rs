//! OpenAI Chat Completions client used for opinion rating.
//!
//! Also works against any server exposing the same wire format when
//! `base_url` is configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::llm::OpenAiConfig;
use crate::port::outbound::llm::Llm;

/// Default Chat Completions endpoint.
const API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug)]
pub struct OpenAi {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: usize,
    temperature: f64,
    system: Option<String>,
}

impl OpenAi {
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

    /// Build a client from config, reading `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a config error if the environment variable is not set.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            Error::Config(ConfigError::MissingField {
                field: "OPENAI_API_KEY",
            })
        })?;
        let mut client = Self::new(api_key, &config.model, config.max_tokens, config.temperature);
        if let Some(url) = &config.base_url {
            client.endpoint = url.clone();
        }
        Ok(client)
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    fn request<'a>(&'a self, prompt: &'a str) -> Request<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: prompt,
        });
        Request {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages,
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f64,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Llm for OpenAi {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request(prompt))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Connection(e.to_string()))?
            .json::<Response>()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}
