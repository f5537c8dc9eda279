//! Configuration for market data tools

use crate::error::{MarketError, Result};
use agent_utils::{env_parse_or, env_string};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by every market tool and provider client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Cache TTL for `get_quote`
    pub cache_ttl_quote: Duration,

    /// Cache TTL for `get_indicators`
    pub cache_ttl_indicators: Duration,

    /// Cache TTL for `get_news_sentiment` and `get_fear_greed`
    pub cache_ttl_sentiment: Duration,

    /// Cache TTL for `web_search`
    pub cache_ttl_search: Duration,

    /// Timeout for a single HTTP request
    pub request_timeout: Duration,

    /// Finnhub API key (company news)
    pub finnhub_api_key: Option<String>,

    /// Tavily API key (web search)
    pub tavily_api_key: Option<String>,

    /// Requests per minute allowed against Yahoo Finance
    pub yahoo_rate_limit: u32,

    /// Requests per minute allowed against Finnhub (free tier: 60)
    pub finnhub_rate_limit: u32,

    /// Requests per minute allowed against Tavily
    pub tavily_rate_limit: u32,

    /// Requests per minute allowed against alternative.me
    pub fear_greed_rate_limit: u32,

    /// Days of company news fed to the sentiment scorer
    pub news_lookback_days: i64,

    /// Days of daily bars used for indicators
    pub history_days: i64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            cache_ttl_quote: Duration::from_secs(60),
            cache_ttl_indicators: Duration::from_secs(300),
            cache_ttl_sentiment: Duration::from_secs(600),
            cache_ttl_search: Duration::from_secs(900),
            request_timeout: Duration::from_secs(30),
            finnhub_api_key: None,
            tavily_api_key: None,
            yahoo_rate_limit: 120,
            finnhub_rate_limit: 60,
            tavily_rate_limit: 30,
            fear_greed_rate_limit: 30,
            news_lookback_days: 7,
            history_days: 90,
        }
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Defaults overlaid with `FINNHUB_API_KEY`, `TAVILY_API_KEY` and
    /// `MARKET_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let timeout = env_parse_or(
            "MARKET_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;

        let config = Self {
            finnhub_api_key: env_string("FINNHUB_API_KEY"),
            tavily_api_key: env_string("TAVILY_API_KEY"),
            request_timeout: Duration::from_secs(timeout),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(MarketError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        let limits = [
            ("yahoo_rate_limit", self.yahoo_rate_limit),
            ("finnhub_rate_limit", self.finnhub_rate_limit),
            ("tavily_rate_limit", self.tavily_rate_limit),
            ("fear_greed_rate_limit", self.fear_greed_rate_limit),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, limit)| *limit == 0) {
            return Err(MarketError::Config(format!("{name} must be greater than 0")));
        }

        if self.history_days < 30 {
            return Err(MarketError::Config(
                "history_days must cover at least 30 days".to_string(),
            ));
        }
        if self.news_lookback_days <= 0 {
            return Err(MarketError::Config(
                "news_lookback_days must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    cache_ttl_quote: Option<Duration>,
    cache_ttl_indicators: Option<Duration>,
    cache_ttl_sentiment: Option<Duration>,
    cache_ttl_search: Option<Duration>,
    request_timeout: Option<Duration>,
    finnhub_api_key: Option<String>,
    tavily_api_key: Option<String>,
    finnhub_rate_limit: Option<u32>,
    tavily_rate_limit: Option<u32>,
    history_days: Option<i64>,
}

impl MarketConfigBuilder {
    pub fn cache_ttl_quote(mut self, ttl: Duration) -> Self {
        self.cache_ttl_quote = Some(ttl);
        self
    }

    pub fn cache_ttl_indicators(mut self, ttl: Duration) -> Self {
        self.cache_ttl_indicators = Some(ttl);
        self
    }

    pub fn cache_ttl_sentiment(mut self, ttl: Duration) -> Self {
        self.cache_ttl_sentiment = Some(ttl);
        self
    }

    pub fn cache_ttl_search(mut self, ttl: Duration) -> Self {
        self.cache_ttl_search = Some(ttl);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn finnhub_api_key(mut self, key: impl Into<String>) -> Self {
        self.finnhub_api_key = Some(key.into());
        self
    }

    pub fn tavily_api_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_api_key = Some(key.into());
        self
    }

    /// Requests per minute against Finnhub (premium tiers allow 300+)
    pub fn finnhub_rate_limit(mut self, per_minute: u32) -> Self {
        self.finnhub_rate_limit = Some(per_minute);
        self
    }

    pub fn tavily_rate_limit(mut self, per_minute: u32) -> Self {
        self.tavily_rate_limit = Some(per_minute);
        self
    }

    pub fn history_days(mut self, days: i64) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();
        let config = MarketConfig {
            cache_ttl_quote: self.cache_ttl_quote.unwrap_or(defaults.cache_ttl_quote),
            cache_ttl_indicators: self
                .cache_ttl_indicators
                .unwrap_or(defaults.cache_ttl_indicators),
            cache_ttl_sentiment: self
                .cache_ttl_sentiment
                .unwrap_or(defaults.cache_ttl_sentiment),
            cache_ttl_search: self.cache_ttl_search.unwrap_or(defaults.cache_ttl_search),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            finnhub_api_key: self.finnhub_api_key.or(defaults.finnhub_api_key),
            tavily_api_key: self.tavily_api_key.or(defaults.tavily_api_key),
            finnhub_rate_limit: self
                .finnhub_rate_limit
                .unwrap_or(defaults.finnhub_rate_limit),
            tavily_rate_limit: self.tavily_rate_limit.unwrap_or(defaults.tavily_rate_limit),
            history_days: self.history_days.unwrap_or(defaults.history_days),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_ttls() {
        let config = MarketConfig::default();
        assert_eq!(config.cache_ttl_quote, Duration::from_secs(60));
        assert_eq!(config.cache_ttl_indicators, Duration::from_secs(300));
        assert_eq!(config.cache_ttl_sentiment, Duration::from_secs(600));
        assert_eq!(config.cache_ttl_search, Duration::from_secs(900));
        assert_ok!(config.validate());
    }

    #[test]
    fn test_builder() {
        let config = MarketConfig::builder()
            .cache_ttl_quote(Duration::from_secs(5))
            .finnhub_api_key("fh-key")
            .finnhub_rate_limit(300)
            .build()
            .unwrap();

        assert_eq!(config.cache_ttl_quote, Duration::from_secs(5));
        assert_eq!(config.finnhub_api_key.as_deref(), Some("fh-key"));
        assert_eq!(config.finnhub_rate_limit, 300);
        assert!(config.tavily_api_key.is_none());
    }

    #[test]
    fn test_validation() {
        let err = MarketConfig::builder()
            .tavily_rate_limit(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("tavily_rate_limit"));

        assert_err!(MarketConfig::builder().history_days(10).build());
        assert_err!(MarketConfig::builder().request_timeout(Duration::ZERO).build());
    }
}
