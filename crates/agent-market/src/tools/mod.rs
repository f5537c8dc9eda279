//! Market tools offered to workers
//!
//! | tool | worker | provider |
//! |---|---|---|
//! | `get_quote` | technical | Yahoo Finance |
//! | `get_indicators` | technical | Yahoo Finance + `ta` |
//! | `get_news_sentiment` | sentiment (stock) | Finnhub |
//! | `get_fear_greed` | sentiment (crypto) | alternative.me |
//! | `web_search` | research | Tavily |

pub mod fear_greed;
pub mod indicators;
pub mod news_sentiment;
pub mod quote;
pub mod web_search;

pub use fear_greed::FearGreedTool;
pub use indicators::IndicatorTool;
pub use news_sentiment::NewsSentimentTool;
pub use quote::QuoteTool;
pub use web_search::WebSearchTool;

use crate::error::MarketError;
use agent_tools::ToolError;

/// How a symbol argument is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolStyle {
    /// Ticker as given, upper-cased
    Equity,
    /// Coin ticker quoted against USD, e.g. `BTC` becomes `BTC-USD`
    Crypto,
}

impl SymbolStyle {
    /// Normalise a symbol argument into the provider's form
    pub fn normalize(self, raw: &str) -> Result<String, ToolError> {
        let symbol = raw.trim().to_uppercase();
        let valid = !symbol.is_empty()
            && symbol.len() <= 15
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
        if !valid {
            return Err(MarketError::InvalidSymbol(raw.to_string()).into());
        }

        Ok(match self {
            Self::Equity => symbol,
            Self::Crypto if symbol.contains('-') => symbol,
            Self::Crypto if symbol == "USD" => {
                return Err(MarketError::InvalidSymbol(raw.to_string()).into());
            }
            Self::Crypto => format!("{}-USD", crypto_base(&symbol)),
        })
    }
}

/// Coins whose own ticker ends in a quote-currency suffix
const USD_NAMED_COINS: &[&str] = &["TUSD", "BUSD", "GUSD", "SUSD", "LUSD", "FDUSD", "PYUSD"];

/// `SOLUSDT` and `BTCUSD` are pairs; `TUSD` is a coin
fn crypto_base(symbol: &str) -> &str {
    if USD_NAMED_COINS.contains(&symbol) {
        return symbol;
    }
    symbol
        .strip_suffix("USDT")
        .or_else(|| symbol.strip_suffix("USD"))
        .filter(|base| base.len() >= 2)
        .unwrap_or(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equity_symbols() {
        assert_eq!(SymbolStyle::Equity.normalize(" aapl ").unwrap(), "AAPL");
        assert_eq!(SymbolStyle::Equity.normalize("BRK.B").unwrap(), "BRK.B");
        assert_eq!(SymbolStyle::Equity.normalize("^GSPC").unwrap(), "^GSPC");
    }

    #[test]
    fn test_crypto_symbols() {
        assert_eq!(SymbolStyle::Crypto.normalize("btc").unwrap(), "BTC-USD");
        assert_eq!(SymbolStyle::Crypto.normalize("ETH-USD").unwrap(), "ETH-USD");
        assert_eq!(SymbolStyle::Crypto.normalize("SOLUSDT").unwrap(), "SOL-USD");
        assert_eq!(SymbolStyle::Crypto.normalize("BTCUSD").unwrap(), "BTC-USD");
        assert_eq!(SymbolStyle::Crypto.normalize("USDT").unwrap(), "USDT-USD");
    }

    #[test]
    fn test_usd_named_coins_kept_whole() {
        assert_eq!(SymbolStyle::Crypto.normalize("TUSD").unwrap(), "TUSD-USD");
        assert_eq!(SymbolStyle::Crypto.normalize("busd").unwrap(), "BUSD-USD");
        assert_eq!(SymbolStyle::Crypto.normalize("PYUSD").unwrap(), "PYUSD-USD");

        let err = SymbolStyle::Crypto.normalize("USD").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_invalid_symbols() {
        for raw in ["", "   ", "AAPL; DROP", "比特币", "ABCDEFGHIJKLMNOPQ"] {
            let err = SymbolStyle::Equity.normalize(raw).unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)), "{raw}");
        }
    }
}
