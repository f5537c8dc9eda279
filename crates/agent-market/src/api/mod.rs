//! Provider clients for market data
//!
//! Each client sits behind a small trait so tools can be exercised without
//! the network. HTTP clients are rate limited with `governor`.

pub mod fear_greed;
pub mod finnhub;
pub mod tavily;
pub mod yahoo;

use crate::error::Result;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

pub use fear_greed::{FearGreedClient, FearGreedReading};
pub use finnhub::{FinnhubClient, NewsArticle};
pub use tavily::{SearchHit, SearchResponse, TavilyClient};
pub use yahoo::{Quote, YahooFinanceClient};

pub(crate) type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Direct limiter allowing `per_minute` requests; zero is treated as one
pub(crate) fn rate_limiter(per_minute: u32) -> SharedRateLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Quotes and daily price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Most recent quote
    async fn latest_quote(&self, symbol: &str) -> Result<Quote>;

    /// Daily bars covering the last `days` days, oldest first
    async fn daily_history(&self, symbol: &str, days: i64) -> Result<Vec<Quote>>;
}

/// Company news headlines
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn company_news(&self, symbol: &str, days: i64) -> Result<Vec<NewsArticle>>;
}

/// Crypto market sentiment index
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SentimentIndex: Send + Sync {
    /// Latest `limit` daily readings, newest first
    async fn readings(&self, limit: usize) -> Result<Vec<FearGreedReading>>;
}

/// Web search
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse>;
}
