//! Market query port.

use async_trait::async_trait;

use crate::domain::{Market, MarketId, MarketState, MarketSummary};
use crate::error::Result;

/// Offset pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    #[must_use]
    pub const fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Request for the following page, if there is one.
    pub next: Option<PageRequest>,
}

/// Read side of the market storage service.
#[async_trait]
pub trait MarketQuery: Send + Sync {
    /// List markets in `state`, ordered by close time.
    async fn list_markets(&self, state: MarketState, page: PageRequest)
        -> Result<Page<MarketSummary>>;

    /// Fetch one market with its full opinion set.
    async fn market(&self, id: &MarketId) -> Result<Option<Market>>;
}
