//! Yahoo Finance client

use super::{PriceSource, SharedRateLimiter, rate_limiter};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// One price bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjclose: f64,
}

impl Quote {
    fn from_yahoo(symbol: &str, quote: &yahoo::Quote) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp: DateTime::from_timestamp(quote.timestamp as i64, 0)
                .unwrap_or_else(Utc::now),
            open: quote.open,
            high: quote.high,
            low: quote.low,
            close: quote.close,
            volume: quote.volume,
            adjclose: quote.adjclose,
        }
    }
}

/// Yahoo Finance client; needs no API key
#[derive(Clone)]
pub struct YahooFinanceClient {
    rate_limiter: SharedRateLimiter,
}

impl YahooFinanceClient {
    pub fn new(rate_limit: u32) -> Self {
        Self {
            rate_limiter: rate_limiter(rate_limit),
        }
    }

    fn connector() -> Result<yahoo::YahooConnector> {
        yahoo::YahooConnector::new().map_err(|e| MarketError::YahooFinance(e.to_string()))
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new(120)
    }
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    async fn latest_quote(&self, symbol: &str) -> Result<Quote> {
        self.rate_limiter.until_ready().await;
        debug!(symbol, "fetching latest quote");

        let response = Self::connector()?
            .get_latest_quotes(symbol, "1d")
            .await
            .map_err(|e| MarketError::YahooFinance(e.to_string()))?;

        let quote = response
            .last_quote()
            .map_err(|e| MarketError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Quote::from_yahoo(symbol, &quote))
    }

    async fn daily_history(&self, symbol: &str, days: i64) -> Result<Vec<Quote>> {
        self.rate_limiter.until_ready().await;
        debug!(symbol, days, "fetching daily history");

        let end = Utc::now();
        let start = end - chrono::Duration::days(days);
        let start = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| MarketError::YahooFinance(format!("Invalid start timestamp: {e}")))?;
        let end = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| MarketError::YahooFinance(format!("Invalid end timestamp: {e}")))?;

        let response = Self::connector()?
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| MarketError::YahooFinance(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| MarketError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;

        Ok(quotes.iter().map(|q| Quote::from_yahoo(symbol, q)).collect())
    }
}
