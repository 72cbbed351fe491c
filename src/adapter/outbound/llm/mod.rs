//! LLM provider clients.
//!
//! Implementations of the [`Llm`](crate::port::outbound::llm::Llm) trait
//! backing the opinion rater.

pub mod anthropic;
pub mod openai;

use std::sync::Arc;

use crate::error::Result;
use crate::infrastructure::config::llm::{LlmConfig, LlmProvider};
use crate::port::outbound::llm::Llm;

use anthropic::Anthropic;
use openai::OpenAi;

/// Instruction sent as the system prompt on every rating request.
pub const RATING_SYSTEM_PROMPT: &str = "You are a strict, impartial grader of short written \
opinions. You answer with JSON only, never prose.";

/// Build the configured provider client.
///
/// # Errors
///
/// Returns a config error if the provider's API key is missing.
pub fn build(config: &LlmConfig) -> Result<Arc<dyn Llm>> {
    let llm: Arc<dyn Llm> = match config.provider {
        LlmProvider::Anthropic => {
            Arc::new(Anthropic::from_config(&config.anthropic)?.with_system(RATING_SYSTEM_PROMPT))
        }
        LlmProvider::OpenAi => {
            Arc::new(OpenAi::from_config(&config.openai)?.with_system(RATING_SYSTEM_PROMPT))
        }
    };
    Ok(llm)
}
