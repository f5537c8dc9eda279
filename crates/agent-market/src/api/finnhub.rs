//! Finnhub company news client

use super::{NewsSource, SharedRateLimiter, rate_limiter};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "finnhub";
const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Publish time (UNIX timestamp)
    pub datetime: i64,
    pub headline: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
}

/// Finnhub client with rate limiting
#[derive(Clone)]
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// `rate_limit` is requests per minute (free tier: 60)
    pub fn new(
        api_key: impl Into<String>,
        rate_limit: u32,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter: rate_limiter(rate_limit),
        })
    }
}

#[async_trait]
impl NewsSource for FinnhubClient {
    async fn company_news(&self, symbol: &str, days: i64) -> Result<Vec<NewsArticle>> {
        self.rate_limiter.until_ready().await;

        let to = Utc::now().date_naive();
        let from = to - Duration::days(days);
        debug!(symbol, %from, %to, "fetching company news");

        let response = self
            .client
            .get(format!("{BASE_URL}/company-news"))
            .query(&[
                ("symbol", symbol.to_string()),
                ("from", from.format("%Y-%m-%d").to_string()),
                ("to", to.format("%Y-%m-%d").to_string()),
                ("token", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketError::RateLimitExceeded { provider: PROVIDER });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_articles(&body)
    }
}

fn parse_articles(body: &str) -> Result<Vec<NewsArticle>> {
    serde_json::from_str(body).map_err(|e| MarketError::Malformed {
        provider: PROVIDER,
        reason: e.to_string(),
    })
}
