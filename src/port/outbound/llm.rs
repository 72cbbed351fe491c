//! LLM completion port for the rating adapter.
//!
//! Defines a generic interface for large language model completion requests.

use async_trait::async_trait;

use crate::error::Result;

/// Client for large language model text completion.
///
/// Implementations wrap specific LLM providers (OpenAI, Anthropic, etc.) and
/// handle authentication and response parsing.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`) so settlement workers
/// can rate markets concurrently.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Return the provider name for logging.
    fn name(&self) -> &'static str;

    /// Send a completion request and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response is invalid.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
