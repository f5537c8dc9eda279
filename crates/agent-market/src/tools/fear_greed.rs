//! `get_fear_greed`: the crypto market Fear & Greed Index

use agent_tools::{Result, Tool, parse_args};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::api::{FearGreedReading, SentimentIndex};
use crate::cache::{CacheKey, CacheService};
use crate::error::MarketError;

pub const NAME: &str = "get_fear_greed";

/// Market-wide crypto sentiment, today and over the last few days
pub struct FearGreedTool {
    source: Arc<dyn SentimentIndex>,
    cache: CacheService,
}

#[derive(Debug, Deserialize)]
struct FearGreedParams {
    #[serde(default = "default_days")]
    days: usize,
}

fn default_days() -> usize {
    7
}

impl FearGreedTool {
    pub fn new(source: Arc<dyn SentimentIndex>, cache: CacheService) -> Self {
        Self { source, cache }
    }

    async fn fetch(&self, days: usize) -> std::result::Result<Value, MarketError> {
        let readings = self.source.readings(days).await?;
        summarize(&readings).ok_or_else(|| MarketError::Malformed {
            provider: "alternative.me",
            reason: "no readings in response".to_string(),
        })
    }
}

/// `readings` is newest first
fn summarize(readings: &[FearGreedReading]) -> Option<Value> {
    let latest = readings.first()?;
    let average =
        readings.iter().map(|r| f64::from(r.value)).sum::<f64>() / readings.len() as f64;
    let oldest = readings.last().map_or(latest.value, |r| r.value);

    let trend = match i16::from(latest.value) - i16::from(oldest) {
        d if d >= 5 => "improving",
        d if d <= -5 => "worsening",
        _ => "steady",
    };

    let history: Vec<Value> = readings
        .iter()
        .map(|r| {
            json!({
                "date": DateTime::from_timestamp(r.timestamp, 0).map(|d| d.date_naive().to_string()),
                "value": r.value,
                "classification": r.classification,
            })
        })
        .collect();

    Some(json!({
        "value": latest.value,
        "classification": latest.classification,
        "average": (average * 10.0).round() / 10.0,
        "trend": trend,
        "history": history,
    }))
}

#[async_trait]
impl Tool for FearGreedTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: FearGreedParams = parse_args(params)?;
        let days = params.days.clamp(1, 30);

        let key = CacheKey::new("CRYPTO", NAME, &json!({ "days": days }));
        let entry = self.cache.get_or_fetch(key, || self.fetch(days)).await?;
        Ok(entry.into_payload())
    }

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Fetch the Crypto Fear & Greed Index (0 = extreme fear, 100 = extreme greed) \
         with its recent daily history and trend. Covers the whole crypto market."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "description": "Days of history to include",
                    "default": 7
                }
            }
        })
    }
}
