//! alternative.me Crypto Fear & Greed Index client

use super::{SentimentIndex, SharedRateLimiter, rate_limiter};
use crate::error::{MarketError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "alternative.me";
const URL: &str = "https://api.alternative.me/fng/";

/// One daily index reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FearGreedReading {
    /// 0 (extreme fear) to 100 (extreme greed)
    pub value: u8,
    pub classification: String,
    /// UNIX timestamp of the reading
    pub timestamp: i64,
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    data: Vec<RawReading>,
}

// The API sends every number as a string
#[derive(Deserialize)]
struct RawReading {
    value: String,
    value_classification: String,
    timestamp: String,
}

impl TryFrom<RawReading> for FearGreedReading {
    type Error = MarketError;

    fn try_from(raw: RawReading) -> Result<Self> {
        let malformed = |field: &str, value: &str| MarketError::Malformed {
            provider: PROVIDER,
            reason: format!("{field} is not a number: {value}"),
        };
        Ok(Self {
            value: raw
                .value
                .parse()
                .map_err(|_| malformed("value", &raw.value))?,
            classification: raw.value_classification,
            timestamp: raw
                .timestamp
                .parse()
                .map_err(|_| malformed("timestamp", &raw.timestamp))?,
        })
    }
}

/// Fear & Greed Index client; needs no API key
#[derive(Clone)]
pub struct FearGreedClient {
    client: Client,
    rate_limiter: SharedRateLimiter,
}

impl FearGreedClient {
    pub fn new(rate_limit: u32, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            rate_limiter: rate_limiter(rate_limit),
        })
    }
}

#[async_trait]
impl SentimentIndex for FearGreedClient {
    async fn readings(&self, limit: usize) -> Result<Vec<FearGreedReading>> {
        self.rate_limiter.until_ready().await;
        debug!(limit, "fetching fear & greed index");

        let response = self
            .client
            .get(URL)
            .query(&[("limit", limit.to_string())])
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

        parse_readings(&response.text().await?)
    }
}

fn parse_readings(body: &str) -> Result<Vec<FearGreedReading>> {
    let raw: RawResponse = serde_json::from_str(body).map_err(|e| MarketError::Malformed {
        provider: PROVIDER,
        reason: e.to_string(),
    })?;
    if raw.data.is_empty() {
        return Err(MarketError::Malformed {
            provider: PROVIDER,
            reason: "no readings in response".to_string(),
        });
    }
    raw.data.into_iter().map(FearGreedReading::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_readings() {
        let body = r#"{
            "name": "Fear and Greed Index",
            "data": [
                {"value": "72", "value_classification": "Greed", "timestamp": "1700006400", "time_until_update": "3600"},
                {"value": "40", "value_classification": "Fear", "timestamp": "1699920000"}
            ],
            "metadata": {"error": null}
        }"#;

        let readings = parse_readings(body).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].value, 72);
        assert_eq!(readings[0].classification, "Greed");
        assert_eq!(readings[1].timestamp, 1_699_920_000);
    }

    #[test]
    fn test_parse_rejects_bad_payloads() {
        assert!(parse_readings(r#"{"data": []}"#).is_err());
        assert!(parse_readings("not json").is_err());

        let err = parse_readings(
            r#"{"data": [{"value": "lots", "value_classification": "Greed", "timestamp": "1"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("value is not a number"));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_readings() {
        let client = FearGreedClient::new(30, Duration::from_secs(30)).unwrap();
        let readings = client.readings(1).await.unwrap();
        assert_eq!(readings.len(), 1);
    }
}
