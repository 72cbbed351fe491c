//! Triple-check scoring with the external rating service.
//!
//! Layers 1 and 2 are pure and live in [`crate::domain::scoring`]. This
//! module adds Layer 3: opinion texts are truncated, split into batches, and
//! rated. A batch that fails for any reason scores every opinion in it at
//! the neutral default, so a flaky rating service never blocks settlement.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use crate::domain::scoring::{compute_distribution, NEUTRAL_SCORE};
use crate::domain::{Distribution, MarketRating, Opinion};
use crate::port::outbound::rating::OpinionRater;

/// Default opinion text length sent for rating.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 500;

/// Default number of opinions per rating request.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Cut `text` to at most `max_chars` characters on a char boundary.
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Scores opinion sets, calling the rating service for Layer 3.
pub struct Scorer {
    rater: Arc<dyn OpinionRater>,
    max_text_chars: usize,
    batch_size: usize,
}

impl Scorer {
    pub fn new(rater: Arc<dyn OpinionRater>) -> Self {
        Self {
            rater,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override truncation length and batch size. Zero values are raised
    /// to one.
    #[must_use]
    pub fn with_limits(mut self, max_text_chars: usize, batch_size: usize) -> Self {
        self.max_text_chars = max_text_chars.max(1);
        self.batch_size = batch_size.max(1);
        self
    }

    fn texts(&self, opinions: &[Opinion]) -> Vec<String> {
        opinions
            .iter()
            .map(|op| truncate_text(&op.text, self.max_text_chars).to_string())
            .collect()
    }

    /// Layer 3: one quality score per opinion, in input order.
    ///
    /// Never fails. Every opinion in a batch the rater could not score gets
    /// [`NEUTRAL_SCORE`].
    pub async fn score_opinion_texts(&self, statement: &str, opinions: &[Opinion]) -> Vec<u8> {
        let texts = self.texts(opinions);
        let mut scores = Vec::with_capacity(texts.len());

        for (batch, chunk) in texts.chunks(self.batch_size).enumerate() {
            match self.rater.rate_opinions(statement, chunk).await {
                Ok(rated) if rated.len() == chunk.len() => {
                    debug!(batch, opinions = chunk.len(), rater = self.rater.name(), "batch rated");
                    scores.extend(rated.into_iter().map(|s| s.min(100)));
                }
                Ok(rated) => {
                    warn!(
                        batch,
                        expected = chunk.len(),
                        actual = rated.len(),
                        "rating batch returned wrong length, using neutral scores"
                    );
                    scores.extend(std::iter::repeat(NEUTRAL_SCORE).take(chunk.len()));
                }
                Err(e) => {
                    warn!(batch, opinions = chunk.len(), error = %e, "rating batch failed, using neutral scores");
                    scores.extend(std::iter::repeat(NEUTRAL_SCORE).take(chunk.len()));
                }
            }
        }

        scores
    }

    /// Market-level sentiment rating.
    ///
    /// Falls back to [`MarketRating::neutral`] on failure and for an empty
    /// opinion set, which is never sent to the rater.
    pub async fn rate_market(&self, statement: &str, opinions: &[Opinion]) -> MarketRating {
        if opinions.is_empty() {
            return MarketRating::neutral(0);
        }
        match self.rater.rate_market(statement, &self.texts(opinions)).await {
            Ok(rating) => rating,
            Err(e) => {
                warn!(error = %e, "market rating failed, using neutral sentiment");
                MarketRating::neutral(opinions.len())
            }
        }
    }

    /// Run all three layers and the dual-pool split for one market.
    ///
    /// The jackpot draw is the only use of `rng`.
    pub async fn compute_triple_check_scores<R: Rng + ?Sized>(
        &self,
        statement: &str,
        opinions: &[Opinion],
        total_stake: u64,
        rng: &mut R,
    ) -> Distribution {
        let ai_scores = self.score_opinion_texts(statement, opinions).await;
        compute_distribution(opinions, &ai_scores, total_stake, rng)
    }
}
