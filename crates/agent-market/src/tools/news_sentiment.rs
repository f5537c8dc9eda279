//! `get_news_sentiment`: recent company news scored with a finance lexicon

use agent_tools::{Result, Tool, parse_args};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::SymbolStyle;
use crate::api::{NewsArticle, NewsSource};
use crate::cache::{CacheKey, CacheService};
use crate::error::MarketError;

pub const NAME: &str = "get_news_sentiment";

const POSITIVE: &[&str] = &[
    "beat", "beats", "surge", "surges", "soar", "soars", "rally", "rallies", "gain", "gains",
    "jump", "jumps", "record", "upgrade", "upgraded", "outperform", "strong", "growth", "profit",
    "bullish", "buy", "raises", "raised", "expands", "approval", "wins", "tops", "rebound",
];

const NEGATIVE: &[&str] = &[
    "miss", "misses", "plunge", "plunges", "drop", "drops", "fall", "falls", "slump", "cut",
    "cuts", "downgrade", "downgraded", "underperform", "weak", "loss", "losses", "bearish",
    "sell", "lawsuit", "probe", "recall", "layoffs", "warning", "warns", "decline", "declines",
    "fraud", "investigation", "delay",
];

/// Bullish/bearish lean of a text in [-1, 1]; zero when no lexicon word appears
pub fn score_text(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let (mut pos, mut neg) = (0_u32, 0_u32);
    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        if POSITIVE.contains(&word) {
            pos += 1;
        } else if NEGATIVE.contains(&word) {
            neg += 1;
        }
    }
    let total = pos + neg;
    if total == 0 {
        0.0
    } else {
        (f64::from(pos) - f64::from(neg)) / f64::from(total)
    }
}

fn label(score: f64) -> &'static str {
    if score > 0.15 {
        "bullish"
    } else if score < -0.15 {
        "bearish"
    } else {
        "neutral"
    }
}

/// Company news from the news source, scored headline by headline
pub struct NewsSentimentTool {
    source: Arc<dyn NewsSource>,
    cache: CacheService,
    lookback_days: i64,
}

#[derive(Debug, Deserialize)]
struct NewsParams {
    symbol: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

impl NewsSentimentTool {
    pub fn new(source: Arc<dyn NewsSource>, cache: CacheService, lookback_days: i64) -> Self {
        Self {
            source,
            cache,
            lookback_days,
        }
    }

    async fn fetch(&self, symbol: &str, limit: usize) -> std::result::Result<Value, MarketError> {
        let mut articles = self.source.company_news(symbol, self.lookback_days).await?;
        articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        articles.truncate(limit);
        Ok(summarize(symbol, &articles))
    }
}

fn summarize(symbol: &str, articles: &[NewsArticle]) -> Value {
    let scored: Vec<(f64, &NewsArticle)> = articles
        .iter()
        .map(|a| (score_text(&format!("{} {}", a.headline, a.summary)), a))
        .collect();

    let count = |f: fn(f64) -> bool| scored.iter().filter(|(s, _)| f(*s)).count();
    let average = if scored.is_empty() {
        0.0
    } else {
        scored.iter().map(|(s, _)| s).sum::<f64>() / scored.len() as f64
    };

    let headlines: Vec<Value> = scored
        .iter()
        .take(5)
        .map(|(score, a)| {
            json!({
                "headline": a.headline,
                "source": a.source,
                "published": DateTime::from_timestamp(a.datetime, 0).map(|d| d.to_rfc3339()),
                "score": (score * 100.0).round() / 100.0,
            })
        })
        .collect();

    json!({
        "symbol": symbol,
        "articles": scored.len(),
        "score": (average * 100.0).round() / 100.0,
        "sentiment": label(average),
        "positive": count(|s| s > 0.0),
        "negative": count(|s| s < 0.0),
        "neutral": count(|s| s == 0.0),
        "headlines": headlines,
    })
}

#[async_trait]
impl Tool for NewsSentimentTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: NewsParams = parse_args(params)?;
        let symbol = SymbolStyle::Equity.normalize(&params.symbol)?;
        let limit = params.limit.clamp(1, 50);

        let key = CacheKey::new(&symbol, NAME, &json!({ "limit": limit }));
        let entry = self
            .cache
            .get_or_fetch(key, || self.fetch(&symbol, limit))
            .await?;
        Ok(entry.into_payload())
    }

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Fetch the past week's company news for a stock ticker and score each headline \
         as bullish, bearish or neutral. Returns the overall sentiment and top headlines."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Stock ticker symbol, e.g. 'AAPL'"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of articles to score",
                    "default": 10
                }
            },
            "required": ["symbol"]
        })
    }
}
