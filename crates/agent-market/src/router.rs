//! Offline keyword classifier
//!
//! A deterministic stand-in for the model-backed classifier: keyword tables
//! (English and Chinese) decide which workers a question needs, and the
//! classifier walks them in order, skipping any worker that already
//! reported, then finishes.

use agent_core::{Result, Role, Route, RoutingDecision};
use agent_workflow::{RouteClassifier, RoutingInput};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Keywords for intent classification (English)
mod keywords_en {
    pub const PRICE: &[&str] = &[
        "price", "quote", "trading at", "how much", "worth", "cost", "current value",
    ];

    pub const TECHNICAL: &[&str] = &[
        "technical", "rsi", "macd", "moving average", "sma", "ema", "bollinger", "indicator",
        "chart", "trend", "support", "resistance", "momentum", "volatility", "atr", "overbought",
        "oversold",
    ];

    pub const SENTIMENT: &[&str] = &[
        "sentiment", "mood", "fear", "greed", "bullish", "bearish", "feel", "hype",
    ];

    pub const RESEARCH: &[&str] = &[
        "news", "why", "event", "headline", "announcement", "earnings", "report", "regulation",
        "lawsuit", "etf", "upgrade", "partnership", "fundamental",
    ];

    pub const BROAD: &[&str] = &[
        "analyze", "analyse", "analysis", "outlook", "overview", "should i", "buy or sell",
        "comprehensive", "full", "deep dive", "forecast", "prospects",
    ];
}

/// Keywords for intent classification (Chinese)
mod keywords_zh {
    pub const PRICE: &[&str] = &["价格", "股价", "报价", "多少钱", "现价", "最新价", "币价"];

    pub const TECHNICAL: &[&str] = &[
        "技术分析", "技术指标", "均线", "移动平均", "布林带", "趋势", "支撑", "阻力", "动量",
        "波动",
    ];

    pub const SENTIMENT: &[&str] = &["情绪", "舆情", "恐慌", "贪婪", "看涨", "看跌"];

    pub const RESEARCH: &[&str] = &["新闻", "消息", "为什么", "公告", "财报", "监管", "事件"];

    pub const BROAD: &[&str] = &["分析", "前景", "展望", "值得买", "综合", "全面", "预测"];
}

// 1-5 capitals, optionally a -USD style pair
static SYMBOL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{1,5}(?:-[A-Z]{3,4})?\b").ok());

const NOT_SYMBOLS: &[&str] = &[
    "I", "A", "AN", "THE", "AND", "OR", "IS", "IT", "OF", "TO", "ON", "IN", "FOR", "WHAT", "HOW",
    "WHY", "RSI", "MACD", "SMA", "EMA", "ATR", "USD", "ETF", "CEO", "AI", "US", "EU", "VS",
];

/// Which workers a question needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub routes: Vec<Route>,
    /// Symbols mentioned in the question
    pub symbols: Vec<String>,
    /// A narrow question answered by the price alone
    pub narrow: bool,
}

impl QueryPlan {
    pub fn for_query(query: &str) -> Self {
        let lower = query.to_lowercase();
        let hit = |en: &[&str], zh: &[&str]| matches_any(&lower, en) || matches_any(query, zh);

        let price = hit(keywords_en::PRICE, keywords_zh::PRICE);
        let technical = hit(keywords_en::TECHNICAL, keywords_zh::TECHNICAL);
        let sentiment = hit(keywords_en::SENTIMENT, keywords_zh::SENTIMENT);
        let research = hit(keywords_en::RESEARCH, keywords_zh::RESEARCH);
        let broad = hit(keywords_en::BROAD, keywords_zh::BROAD);

        let specific = price || technical || sentiment || research;
        let routes = if broad || !specific {
            Route::WORKERS.to_vec()
        } else {
            let wanted = [
                (Route::Technical, price || technical),
                (Route::Sentiment, sentiment),
                (Route::Research, research),
            ];
            wanted
                .into_iter()
                .filter_map(|(route, wanted)| wanted.then_some(route))
                .collect()
        };

        Self {
            narrow: price && routes == [Route::Technical],
            routes,
            symbols: extract_symbols(query),
        }
    }
}

fn matches_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Ticker-looking words, deduplicated in order of appearance
pub fn extract_symbols(query: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    let Some(re) = SYMBOL.as_ref() else {
        return symbols;
    };
    for m in re.find_iter(query) {
        let symbol = m.as_str();
        if !NOT_SYMBOLS.contains(&symbol) && !symbols.iter().any(|s| s == symbol) {
            symbols.push(symbol.to_string());
        }
    }
    symbols
}

/// Rule-based classifier needing no model
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRouteClassifier;

impl KeywordRouteClassifier {
    pub fn new() -> Self {
        Self
    }

    /// A worker has reported once it merged data or left commentary
    fn has_reported(input: &RoutingInput, route: Route) -> bool {
        let name = route.as_str();
        input.data.contains_key(name)
            || input
                .recent_messages
                .iter()
                .any(|m| m.role == Role::Agent && m.sender.as_deref() == Some(name))
    }

    pub fn decide(&self, input: &RoutingInput) -> RoutingDecision {
        let plan = QueryPlan::for_query(&input.query);
        debug!(?plan, "keyword plan");

        let subject = if plan.symbols.is_empty() {
            String::new()
        } else {
            format!(" for {}", plan.symbols.join(", "))
        };

        let next = plan
            .routes
            .iter()
            .copied()
            .filter(|route| input.available.contains(route))
            .find(|route| !Self::has_reported(input, *route));

        match next {
            Some(Route::Technical) if plan.narrow => {
                RoutingDecision::new(Route::Technical, format!("price lookup{subject}"))
            }
            Some(route) => {
                RoutingDecision::new(route, format!("{route} data still missing{subject}"))
            }
            None => {
                RoutingDecision::finish(format!("collected data covers the question{subject}"))
            }
        }
    }
}

#[async_trait]
impl RouteClassifier for KeywordRouteClassifier {
    async fn classify(&self, input: &RoutingInput) -> Result<RoutingDecision> {
        Ok(self.decide(input))
    }
}
