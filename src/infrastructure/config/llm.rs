//! LLM provider configuration.
//!
//! Selects the model that backs the opinion rater. API keys are never read
//! from the config file.

use serde::Deserialize;

/// LLM provider configuration.
///
/// API keys are read from `ANTHROPIC_API_KEY` or `OPENAI_API_KEY` at
/// startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    /// Provider used for opinion and market ratings. Defaults to Anthropic.
    #[serde(default)]
    pub provider: LlmProvider,

    #[serde(default)]
    pub anthropic: AnthropicConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,
}

impl LlmConfig {
    /// Environment variable holding the active provider's API key.
    #[must_use]
    pub const fn api_key_var(&self) -> &'static str {
        match self.provider {
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Model name of the active provider.
    #[must_use]
    pub fn model(&self) -> &str {
        match self.provider {
            LlmProvider::Anthropic => &self.anthropic.model,
            LlmProvider::OpenAi => &self.openai.model,
        }
    }
}

/// LLM provider selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    OpenAi,
}

impl LlmProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }
}

/// Anthropic Messages API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicConfig {
    /// Defaults to "claude-3-5-haiku-20241022".
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Sampling temperature, 0.0 by default.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Override for the API endpoint, e.g. a local proxy.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: default_anthropic_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: None,
        }
    }
}

/// OpenAI Chat Completions settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Defaults to "gpt-4o-mini".
    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: default_openai_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: None,
        }
    }
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-20241022".into()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f64 {
    0.0
}

const fn default_max_tokens() -> usize {
    2048
}
