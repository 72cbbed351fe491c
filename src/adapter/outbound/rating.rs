//! LLM-backed opinion rater.
//!
//! Opinions are listed under short reference labels (O1, O2, ...) and the
//! model must answer with a bare JSON array in the same order. Anything else
//! is reported as a [`RatingError`] so the caller can fall back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{Confidence, MarketRating};
use crate::error::{RatingError, Result};
use crate::port::outbound::llm::Llm;
use crate::port::outbound::rating::OpinionRater;

pub struct LlmRater {
    llm: Arc<dyn Llm>,
    timeout: Duration,
}

impl LlmRater {
    pub fn new(llm: Arc<dyn Llm>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.llm.complete(prompt)).await {
            Ok(response) => response,
            Err(_) => Err(RatingError::Timeout {
                secs: self.timeout.as_secs(),
            }
            .into()),
        }
    }
}

fn opinion_list(texts: &[String]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| format!("O{}: {}", i + 1, t.replace('\n', " ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn opinion_prompt(statement: &str, texts: &[String]) -> String {
    let n = texts.len();
    let list = opinion_list(texts);
    format!(
        r#"Rate each opinion about the statement below for quality.

## Statement
{statement}

## Opinions
{list}

## Criteria
Clarity, insight, reasoning, and originality. Do not reward agreement or
disagreement with the statement.

## Output
A JSON array of exactly {n} integers from 0 to 100, one per opinion, in the
order listed (O1 first). Example for three opinions: [72, 15, 88]
Return the array only.
"#
    )
}

fn summary_prompt(statement: &str, texts: &[String]) -> String {
    let list = opinion_list(texts);
    format!(
        r#"Summarize overall crowd sentiment toward the statement below.

## Statement
{statement}

## Opinions
{list}

## Output (JSON only)
{{"score": 0-100 agreement with the statement, "confidence": 0 (low) | 1 (medium) | 2 (high), "summary": "two sentences at most"}}
"#
    )
}

/// Pull the JSON payload out of a model response.
///
/// Accepts a fenced code block or the outermost `open`..`close` span.
fn extract_json(text: &str, open: char, close: char) -> std::result::Result<&str, RatingError> {
    if let Some(start) = text.find("```") {
        let body = &text[start + 3..];
        let body = body.strip_prefix("json").unwrap_or(body);
        let end = body.find("```").unwrap_or(body.len());
        return Ok(body[..end].trim());
    }
    match (text.find(open), text.rfind(close)) {
        (Some(start), Some(end)) if end > start => Ok(&text[start..=end]),
        _ => Err(RatingError::Malformed(format!("no {open}{close} payload in response"))),
    }
}

/// Parse a strict JSON array of `expected` integers in 0..=100.
///
/// # Errors
///
/// Returns [`RatingError`] on anything but an exact, in-range array.
pub fn parse_scores(response: &str, expected: usize) -> std::result::Result<Vec<u8>, RatingError> {
    let json = extract_json(response, '[', ']')?;
    let raw: Vec<i64> =
        serde_json::from_str(json).map_err(|e| RatingError::Malformed(e.to_string()))?;

    if raw.len() != expected {
        return Err(RatingError::LengthMismatch {
            expected,
            actual: raw.len(),
        });
    }

    raw.into_iter()
        .map(|v| match u8::try_from(v) {
            Ok(s) if s <= 100 => Ok(s),
            _ => Err(RatingError::OutOfRange(v)),
        })
        .collect()
}

#[derive(Deserialize)]
struct RawMarketRating {
    score: i64,
    confidence: i64,
    #[serde(default)]
    summary: String,
}

/// Parse the market summary object.
///
/// # Errors
///
/// Returns [`RatingError`] on malformed JSON or out-of-range values.
pub fn parse_market_rating(response: &str) -> std::result::Result<MarketRating, RatingError> {
    let json = extract_json(response, '{', '}')?;
    let raw: RawMarketRating =
        serde_json::from_str(json).map_err(|e| RatingError::Malformed(e.to_string()))?;

    let score = match u8::try_from(raw.score) {
        Ok(s) if s <= 100 => s,
        _ => return Err(RatingError::OutOfRange(raw.score)),
    };
    let confidence = u8::try_from(raw.confidence)
        .ok()
        .and_then(|c| Confidence::try_from(c).ok())
        .ok_or(RatingError::OutOfRange(raw.confidence))?;

    Ok(MarketRating {
        score,
        confidence,
        summary: raw.summary.trim().to_string(),
    })
}

#[async_trait]
impl OpinionRater for LlmRater {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn rate_opinions(&self, statement: &str, texts: &[String]) -> Result<Vec<u8>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self.complete(&opinion_prompt(statement, texts)).await?;
        debug!(provider = self.llm.name(), count = texts.len(), "opinion rating complete");

        Ok(parse_scores(&response, texts.len())?)
    }

    async fn rate_market(&self, statement: &str, texts: &[String]) -> Result<MarketRating> {
        let response = self.complete(&summary_prompt(statement, texts)).await?;
        debug!(provider = self.llm.name(), "market rating complete");

        Ok(parse_market_rating(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testkit::llm::{MockLlm, StalledLlm};

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("opinion {i}")).collect()
    }

    #[test]
    fn parses_bare_array() {
        assert_eq!(parse_scores("[80, 0, 100]", 3).unwrap(), vec![80, 0, 100]);
    }

    #[test]
    fn parses_fenced_array_with_chatter() {
        let response = "Here you go:\n```json\n[12, 34]\n```\nThanks";
        assert_eq!(parse_scores(response, 2).unwrap(), vec![12, 34]);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(
            parse_scores("[1, 2]", 3).unwrap_err(),
            RatingError::LengthMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert_eq!(
            parse_scores("[50, 101]", 2).unwrap_err(),
            RatingError::OutOfRange(101)
        );
        assert_eq!(
            parse_scores("[-1]", 1).unwrap_err(),
            RatingError::OutOfRange(-1)
        );
    }

    #[test]
    fn fractional_scores_are_malformed() {
        assert!(matches!(
            parse_scores("[50.5]", 1),
            Err(RatingError::Malformed(_))
        ));
    }

    #[test]
    fn prose_is_malformed() {
        assert!(matches!(
            parse_scores("I think they are all great", 2),
            Err(RatingError::Malformed(_))
        ));
    }

    #[test]
    fn parses_market_rating() {
        let rating = parse_market_rating(
            r#"{"score": 64, "confidence": 1, "summary": " Mostly agree. "}"#,
        )
        .unwrap();
        assert_eq!(rating.score, 64);
        assert_eq!(rating.confidence, Confidence::Medium);
        assert_eq!(rating.summary, "Mostly agree.");
    }

    #[test]
    fn market_rating_rejects_bad_confidence() {
        let err = parse_market_rating(r#"{"score": 64, "confidence": 3}"#).unwrap_err();
        assert_eq!(err, RatingError::OutOfRange(3));
    }

    #[test]
    fn prompt_lists_opinions_in_order() {
        let prompt = opinion_prompt("Rust is great", &["yes\nreally".into(), "no".into()]);
        assert!(prompt.contains("O1: yes really"));
        assert!(prompt.contains("O2: no"));
        assert!(prompt.contains("exactly 2 integers"));
    }

    #[tokio::test]
    async fn rates_through_llm() {
        let rater = LlmRater::new(Arc::new(MockLlm::new("[10, 20, 30]")), Duration::from_secs(5));
        let scores = rater.rate_opinions("s", &texts(3)).await.unwrap();
        assert_eq!(scores, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn empty_batch_skips_the_llm() {
        let rater = LlmRater::new(Arc::new(MockLlm::new("not json")), Duration::from_secs(5));
        assert!(rater.rate_opinions("s", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_llm_times_out() {
        let rater = LlmRater::new(Arc::new(StalledLlm), Duration::from_millis(20));
        let err = rater.rate_opinions("s", &texts(2)).await.unwrap_err();
        assert!(matches!(err, Error::Rating(RatingError::Timeout { .. })));
        assert!(!err.to_string().is_empty());
    }
}
