//! Tavily web search client

use super::{SearchProvider, SharedRateLimiter, rate_limiter};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "tavily";
const URL: &str = "https://api.tavily.com/search";

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

/// Search results plus Tavily's short answer when it has one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

/// Tavily client with rate limiting
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter: rate_limiter(rate_limit),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        self.rate_limiter.until_ready().await;
        debug!(query, max_results, "web search");

        let response = self
            .client
            .post(URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "query": query,
                "max_results": max_results,
                "search_depth": "basic",
                "include_answer": true,
            }))
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
        serde_json::from_str(&body).map_err(|e| MarketError::Malformed {
            provider: PROVIDER,
            reason: e.to_string(),
        })
    }
}
