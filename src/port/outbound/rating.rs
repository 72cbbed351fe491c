//! External opinion rating port.

use async_trait::async_trait;

use crate::domain::MarketRating;
use crate::error::Result;

/// Black-box natural-language rating service.
///
/// Both calls are strict: any deviation from the expected response shape is
/// an error. Callers decide how to degrade.
#[async_trait]
pub trait OpinionRater: Send + Sync {
    /// Return the rater name for logging.
    fn name(&self) -> &'static str;

    /// Rate each text for clarity, insight, reasoning, and originality.
    ///
    /// Returns exactly one score in 0..=100 per text, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`](crate::error::RatingError) on timeout, a
    /// malformed response, a wrong-length array, or an out-of-range score.
    async fn rate_opinions(&self, statement: &str, texts: &[String]) -> Result<Vec<u8>>;

    /// Produce a single market-level sentiment score, confidence, and summary.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`rate_opinions`](Self::rate_opinions).
    async fn rate_market(&self, statement: &str, texts: &[String]) -> Result<MarketRating>;
}
