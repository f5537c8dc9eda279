//! `get_quote`: latest price for a symbol

use agent_tools::{Result, Tool, parse_args};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::SymbolStyle;
use crate::api::PriceSource;
use crate::cache::{CacheKey, CacheService};
use crate::error::MarketError;

pub const NAME: &str = "get_quote";

/// Latest quote from the price source
pub struct QuoteTool {
    source: Arc<dyn PriceSource>,
    cache: CacheService,
    style: SymbolStyle,
}

#[derive(Debug, Deserialize)]
struct QuoteParams {
    symbol: String,
}

impl QuoteTool {
    pub fn new(source: Arc<dyn PriceSource>, cache: CacheService, style: SymbolStyle) -> Self {
        Self {
            source,
            cache,
            style,
        }
    }

    async fn fetch(&self, symbol: &str) -> std::result::Result<Value, MarketError> {
        let quote = self.source.latest_quote(symbol).await?;
        let change_pct = if quote.open > 0.0 {
            (quote.close - quote.open) / quote.open * 100.0
        } else {
            0.0
        };

        Ok(json!({
            "symbol": symbol,
            "price": quote.close,
            "open": quote.open,
            "high": quote.high,
            "low": quote.low,
            "volume": quote.volume,
            "change_percent": (change_pct * 100.0).round() / 100.0,
            "as_of": quote.timestamp.to_rfc3339(),
        }))
    }
}

#[async_trait]
impl Tool for QuoteTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: QuoteParams = parse_args(params)?;
        let symbol = self.style.normalize(&params.symbol)?;

        let key = CacheKey::new(&symbol, NAME, &json!({}));
        let entry = self
            .cache
            .get_or_fetch(key, || self.fetch(&symbol))
            .await?;
        Ok(entry.into_payload())
    }

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        match self.style {
            SymbolStyle::Equity => {
                "Fetch the latest price quote (price, open, high, low, volume, daily change) \
                 for a stock ticker such as AAPL or TSLA."
            }
            SymbolStyle::Crypto => {
                "Fetch the latest USD price quote (price, open, high, low, volume, daily change) \
                 for a cryptocurrency such as BTC or ETH."
            }
        }
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. 'AAPL' or 'BTC'"
                }
            },
            "required": ["symbol"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockPriceSource, Quote};
    use agent_tools::ToolError;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn quote(symbol: &str, open: f64, close: f64) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 2, 21, 0, 0).unwrap(),
            open,
            high: close.max(open),
            low: close.min(open),
            close,
            volume: 1_000,
            adjclose: close,
        }
    }

    fn tool(source: MockPriceSource, style: SymbolStyle) -> QuoteTool {
        QuoteTool::new(Arc::new(source), CacheService::new(Duration::from_secs(60)), style)
    }

    #[tokio::test]
    async fn test_crypto_quote() {
        let mut source = MockPriceSource::new();
        source
            .expect_latest_quote()
            .withf(|symbol| symbol == "BTC-USD")
            .times(1)
            .returning(|s| Ok(quote(s, 66000.0, 67000.5)));

        let tool = tool(source, SymbolStyle::Crypto);
        let payload = tool.execute(json!({"symbol": "btc"})).await.unwrap();

        assert_eq!(payload["symbol"], "BTC-USD");
        assert_eq!(payload["price"], 67000.5);
        assert_eq!(payload["change_percent"], 1.52);
        assert!(payload["fetched_at"].is_string());
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let mut source = MockPriceSource::new();
        source
            .expect_latest_quote()
            .times(1)
            .returning(|s| Ok(quote(s, 100.0, 101.0)));

        let tool = tool(source, SymbolStyle::Equity);
        let first = tool.execute(json!({"symbol": "aapl"})).await.unwrap();
        let second = tool.execute(json!({"symbol": "AAPL"})).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_tool_error() {
        let mut source = MockPriceSource::new();
        source.expect_latest_quote().returning(|s| {
            Err(MarketError::DataUnavailable {
                symbol: s.to_string(),
                reason: "no trades".into(),
            })
        });

        let err = tool(source, SymbolStyle::Equity)
            .execute(json!({"symbol": "ZZZZ"}))
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::Unavailable("No data for ZZZZ: no trades".into()));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let tool = tool(MockPriceSource::new(), SymbolStyle::Equity);
        let err = tool.execute(json!({"ticker": "AAPL"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
