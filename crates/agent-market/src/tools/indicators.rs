//! `get_indicators`: technical indicators over daily history

use agent_tools::{Result, Tool, parse_args};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use ta::Next;
use ta::indicators::{
    AverageTrueRange, BollingerBands, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    RelativeStrengthIndex, SimpleMovingAverage,
};

use super::SymbolStyle;
use crate::api::{PriceSource, Quote};
use crate::cache::{CacheKey, CacheService};
use crate::error::MarketError;

pub const NAME: &str = "get_indicators";

/// Indicator names the tool understands
pub const SUPPORTED: &[&str] = &["RSI", "SMA", "EMA", "MACD", "BBANDS", "ATR"];

const DEFAULT_PERIOD: usize = 14;
const MAX_PERIOD: usize = 200;

/// Computes indicators with the `ta` crate over the configured history window
pub struct IndicatorTool {
    source: Arc<dyn PriceSource>,
    cache: CacheService,
    style: SymbolStyle,
    history_days: i64,
}

#[derive(Debug, Deserialize)]
struct IndicatorParams {
    symbol: String,
    indicators: Vec<String>,
    #[serde(default)]
    period: Option<usize>,
}

impl IndicatorTool {
    pub fn new(
        source: Arc<dyn PriceSource>,
        cache: CacheService,
        style: SymbolStyle,
        history_days: i64,
    ) -> Self {
        Self {
            source,
            cache,
            style,
            history_days,
        }
    }

    async fn fetch(
        &self,
        symbol: &str,
        names: &[String],
        period: usize,
    ) -> std::result::Result<Value, MarketError> {
        let bars = self.source.daily_history(symbol, self.history_days).await?;
        if bars.is_empty() {
            return Err(MarketError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no historical data".to_string(),
            });
        }

        let mut indicators = Map::new();
        for name in names {
            let value = compute(name, &bars, period).unwrap_or_else(|e| json!({ "error": e }));
            indicators.insert(name.clone(), value);
        }

        Ok(json!({
            "symbol": symbol,
            "period": period,
            "data_points": bars.len(),
            "last_close": bars.last().map(|b| b.close),
            "indicators": indicators,
        }))
    }
}

/// One indicator's latest reading; errors are reported, not raised
fn compute(name: &str, bars: &[Quote], period: usize) -> std::result::Result<Value, String> {
    let closes = bars.iter().map(|b| b.close);
    let last_close = bars.last().map_or(0.0, |b| b.close);

    match name {
        "RSI" => {
            let mut rsi = RelativeStrengthIndex::new(period).map_err(|e| e.to_string())?;
            let value = closes.map(|c| rsi.next(c)).last().unwrap_or_default();
            Ok(json!({
                "value": round(value),
                "signal": interpret_rsi(value),
            }))
        }
        "SMA" => {
            let mut sma = SimpleMovingAverage::new(period).map_err(|e| e.to_string())?;
            let value = closes.map(|c| sma.next(c)).last().unwrap_or_default();
            Ok(json!({
                "value": round(value),
                "price_vs_average": if last_close >= value { "above" } else { "below" },
            }))
        }
        "EMA" => {
            let mut ema = ExponentialMovingAverage::new(period).map_err(|e| e.to_string())?;
            let value = closes.map(|c| ema.next(c)).last().unwrap_or_default();
            Ok(json!({
                "value": round(value),
                "price_vs_average": if last_close >= value { "above" } else { "below" },
            }))
        }
        "MACD" => {
            let mut macd =
                MovingAverageConvergenceDivergence::new(12, 26, 9).map_err(|e| e.to_string())?;
            let out = closes
                .map(|c| macd.next(c))
                .last()
                .ok_or_else(|| "no data".to_string())?;
            Ok(json!({
                "macd": round(out.macd),
                "signal": round(out.signal),
                "histogram": round(out.histogram),
                "trend": if out.histogram >= 0.0 { "bullish" } else { "bearish" },
            }))
        }
        "BBANDS" => {
            let mut bb = BollingerBands::new(period, 2.0).map_err(|e| e.to_string())?;
            let out = closes
                .map(|c| bb.next(c))
                .last()
                .ok_or_else(|| "no data".to_string())?;
            let position = if last_close > out.upper {
                "above upper band"
            } else if last_close < out.lower {
                "below lower band"
            } else {
                "inside bands"
            };
            Ok(json!({
                "upper": round(out.upper),
                "middle": round(out.average),
                "lower": round(out.lower),
                "position": position,
            }))
        }
        "ATR" => {
            let mut atr = AverageTrueRange::new(period).map_err(|e| e.to_string())?;
            let mut value = 0.0;
            for bar in bars {
                let item = ta::DataItem::builder()
                    .open(bar.open)
                    .high(bar.high)
                    .low(bar.low)
                    .close(bar.close)
                    .volume(bar.volume as f64)
                    .build()
                    .map_err(|e| format!("bad bar at {}: {e}", bar.timestamp.date_naive()))?;
                value = atr.next(&item);
            }
            let percent = if last_close > 0.0 {
                value / last_close * 100.0
            } else {
                0.0
            };
            Ok(json!({
                "value": round(value),
                "percent_of_price": round(percent),
            }))
        }
        other => Err(format!(
            "Unsupported indicator: {other}. Supported: {}",
            SUPPORTED.join(", ")
        )),
    }
}

fn interpret_rsi(rsi: f64) -> &'static str {
    if rsi > 70.0 {
        "overbought"
    } else if rsi < 30.0 {
        "oversold"
    } else {
        "neutral"
    }
}

fn round(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Upper-case, map aliases, drop duplicates while keeping order
fn normalize_names(raw: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw {
        let name = match name.trim().to_uppercase().as_str() {
            "BB" | "BOLLINGER" => "BBANDS".to_string(),
            other => other.to_string(),
        };
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[async_trait]
impl Tool for IndicatorTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: IndicatorParams = parse_args(params)?;
        let symbol = self.style.normalize(&params.symbol)?;

        let names = normalize_names(&params.indicators);
        if names.is_empty() {
            return Err(agent_tools::ToolError::InvalidArguments(
                "indicators must name at least one indicator".to_string(),
            ));
        }
        let period = params.period.unwrap_or(DEFAULT_PERIOD).clamp(2, MAX_PERIOD);

        let key = CacheKey::new(&symbol, NAME, &json!({ "indicators": &names, "period": period }));
        let entry = self
            .cache
            .get_or_fetch(key, || self.fetch(&symbol, &names, period))
            .await?;
        Ok(entry.into_payload())
    }

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Calculate technical indicators from about three months of daily prices. \
         Supports RSI, SMA, EMA, MACD, BBANDS (Bollinger Bands) and ATR; request several at once."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. 'TSLA' or 'ETH'"
                },
                "indicators": {
                    "type": "array",
                    "items": { "type": "string", "enum": SUPPORTED },
                    "description": "Indicators to calculate"
                },
                "period": {
                    "type": "integer",
                    "description": "Look-back period for RSI, SMA, EMA, BBANDS and ATR",
                    "default": DEFAULT_PERIOD
                }
            },
            "required": ["symbol", "indicators"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockPriceSource;
    use agent_tools::ToolError;
    use chrono::{TimeDelta, TimeZone, Utc};
    use std::time::Duration;

    /// Daily bars with a steady climb
    fn rising_bars(n: usize) -> Vec<Quote> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 21, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                Quote {
                    symbol: "TSLA".into(),
                    timestamp: start + TimeDelta::days(i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10_000,
                    adjclose: close,
                }
            })
            .collect()
    }

    fn tool(source: MockPriceSource) -> IndicatorTool {
        IndicatorTool::new(
            Arc::new(source),
            CacheService::new(Duration::from_secs(300)),
            SymbolStyle::Equity,
            90,
        )
    }

    #[test]
    fn test_rsi_on_rising_prices() {
        let value = compute("RSI", &rising_bars(60), 14).unwrap();
        assert!(value["value"].as_f64().unwrap() > 70.0);
        assert_eq!(value["signal"], "overbought");
    }

    #[test]
    fn test_moving_averages_trail_price() {
        let bars = rising_bars(60);
        let sma = compute("SMA", &bars, 10).unwrap();
        assert_eq!(sma["value"], 154.5);
        assert_eq!(sma["price_vs_average"], "above");

        let ema = compute("EMA", &bars, 10).unwrap();
        assert_eq!(ema["price_vs_average"], "above");
    }

    #[test]
    fn test_macd_bbands_atr() {
        let bars = rising_bars(60);
        assert_eq!(compute("MACD", &bars, 14).unwrap()["trend"], "bullish");

        let bands = compute("BBANDS", &bars, 20).unwrap();
        assert!(bands["upper"].as_f64().unwrap() > bands["lower"].as_f64().unwrap());

        let atr = compute("ATR", &bars, 14).unwrap();
        assert!(atr["value"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_unsupported_indicator() {
        let err = compute("STOCH", &rising_bars(5), 14).unwrap_err();
        assert!(err.starts_with("Unsupported indicator: STOCH"));
    }

    #[test]
    fn test_normalize_names() {
        let raw = vec!["rsi".into(), " bb ".into(), "RSI".into(), String::new()];
        assert_eq!(normalize_names(&raw), vec!["RSI", "BBANDS"]);
    }

    #[tokio::test]
    async fn test_unsupported_reported_per_indicator() {
        let mut source = MockPriceSource::new();
        source
            .expect_daily_history()
            .withf(|symbol, days| symbol == "TSLA" && *days == 90)
            .times(1)
            .returning(|_, _| Ok(rising_bars(60)));

        let payload = tool(source)
            .execute(json!({"symbol": "tsla", "indicators": ["RSI", "VWAP"]}))
            .await
            .unwrap();

        assert_eq!(payload["symbol"], "TSLA");
        assert_eq!(payload["data_points"], 60);
        assert!(payload["indicators"]["RSI"]["value"].is_number());
        assert!(
            payload["indicators"]["VWAP"]["error"]
                .as_str()
                .unwrap()
                .contains("Unsupported")
        );
    }

    #[tokio::test]
    async fn test_empty_history_is_unavailable() {
        let mut source = MockPriceSource::new();
        source.expect_daily_history().returning(|_, _| Ok(Vec::new()));

        let err = tool(source)
            .execute(json!({"symbol": "TSLA", "indicators": ["RSI"]}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_requires_indicators() {
        let err = tool(MockPriceSource::new())
            .execute(json!({"symbol": "TSLA", "indicators": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
