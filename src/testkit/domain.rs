//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions for opinions, markets, jobs, and
//! checkpoints so tests focus on assertions rather than construction
//! boilerplate.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::scoring::compute_distribution;
use crate::domain::{
    Market, MarketId, MarketRating, MarketState, Opinion, SettlementCheckpoint, SettlementJob,
};

/// One micro-unit dollar.
pub const USDC: u64 = 1_000_000;

/// Create an [`Opinion`] staked by `staker-{id}` with no peer activity.
pub fn opinion(id: &str, stake: u64, opinion_score: u8, market_prediction: u8) -> Opinion {
    Opinion::new(
        id,
        format!("staker-{id}"),
        stake,
        format!("opinion {id}"),
        opinion_score,
        market_prediction,
    )
}

/// Create a [`Market`] whose total stake is the sum of its opinion stakes.
///
/// The market opened two hours ago and closed one hour ago.
pub fn market(id: &str, state: MarketState, opinions: Vec<Opinion>) -> Market {
    let now = Utc::now();
    Market {
        id: MarketId::new(id),
        statement: format!("statement for {id}"),
        state,
        created_at: now - Duration::hours(2),
        closes_at: now - Duration::hours(1),
        total_stake: opinions.iter().map(|o| o.stake).sum(),
        opinions,
    }
}

/// Three opinions with stakes of $1, $2, and $2, agreement 80/40/60 and
/// predictions 70/50/55.
pub fn three_opinions() -> Vec<Opinion> {
    vec![
        opinion("a", USDC, 80, 70),
        opinion("b", 2 * USDC, 40, 50),
        opinion("c", 2 * USDC, 60, 55),
    ]
}

/// The three-opinion market with a $5 escrow.
pub fn three_opinion_market(id: &str, state: MarketState) -> Market {
    let mut m = market(id, state, three_opinions());
    m.total_stake = 5 * USDC;
    m
}

/// A valid settlement job for `market_id` with two opinions.
pub fn job(market_id: &str) -> SettlementJob {
    SettlementJob::new(
        MarketId::new(market_id),
        format!("statement for {market_id}"),
        vec![opinion("a", USDC, 70, 60), opinion("b", USDC, 30, 40)],
        2 * USDC,
    )
    .expect("valid job")
}

/// Score `market` with fixed AI scores and a seeded jackpot draw.
pub fn checkpoint(market: &Market, ai_scores: &[u8], seed: u64) -> SettlementCheckpoint {
    let mut rng = StdRng::seed_from_u64(seed);
    SettlementCheckpoint {
        market_id: market.id.clone(),
        rating: MarketRating::neutral(market.opinions.len()),
        distribution: compute_distribution(
            &market.opinions,
            ai_scores,
            market.total_stake,
            &mut rng,
        ),
        created_at: Utc::now(),
    }
}
