//! Scripted LLM clients and opinion raters.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Confidence, MarketRating};
use crate::error::{RatingError, Result};
use crate::port::outbound::llm::Llm;
use crate::port::outbound::rating::OpinionRater;

/// LLM that answers every prompt with the same text.
pub struct MockLlm {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.response.clone())
    }
}

/// LLM that never answers.
pub struct StalledLlm;

#[async_trait]
impl Llm for StalledLlm {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        std::future::pending().await
    }
}

/// Rater returning the same score for every text.
pub struct FixedRater {
    score: u8,
    rating: MarketRating,
    opinion_calls: AtomicUsize,
    market_calls: AtomicUsize,
}

impl FixedRater {
    pub fn new(score: u8) -> Self {
        Self {
            score,
            rating: MarketRating {
                score,
                confidence: Confidence::Medium,
                summary: format!("crowd leans {score}"),
            },
            opinion_calls: AtomicUsize::new(0),
            market_calls: AtomicUsize::new(0),
        }
    }

    pub fn opinion_calls(&self) -> usize {
        self.opinion_calls.load(Ordering::SeqCst)
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OpinionRater for FixedRater {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn rate_opinions(&self, _statement: &str, texts: &[String]) -> Result<Vec<u8>> {
        self.opinion_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.score; texts.len()])
    }

    async fn rate_market(&self, _statement: &str, _texts: &[String]) -> Result<MarketRating> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rating.clone())
    }
}

/// Rater whose every call times out.
#[derive(Default)]
pub struct FailingRater {
    calls: AtomicUsize,
}

impl FailingRater {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OpinionRater for FailingRater {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn rate_opinions(&self, _statement: &str, _texts: &[String]) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RatingError::Timeout { secs: 30 }.into())
    }

    async fn rate_market(&self, _statement: &str, _texts: &[String]) -> Result<MarketRating> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RatingError::Timeout { secs: 30 }.into())
    }
}

/// Rater that fails on the listed batch calls (0-based) and scores the
/// rest with the batch index plus one.
pub struct BatchFailingRater {
    failing: Vec<usize>,
    calls: AtomicUsize,
}

impl BatchFailingRater {
    pub fn new(failing: Vec<usize>) -> Self {
        Self {
            failing,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl OpinionRater for BatchFailingRater {
    fn name(&self) -> &'static str {
        "batch-failing"
    }

    async fn rate_opinions(&self, _statement: &str, texts: &[String]) -> Result<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&call) {
            return Err(RatingError::Malformed("scripted failure".into()).into());
        }
        Ok(vec![u8::try_from(call + 1).unwrap_or(u8::MAX); texts.len()])
    }

    async fn rate_market(&self, _statement: &str, texts: &[String]) -> Result<MarketRating> {
        Ok(MarketRating::neutral(texts.len()))
    }
}
