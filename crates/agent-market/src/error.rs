//! Error types for market data providers

use agent_tools::ToolError;
use agent_utils::ConfigError;
use thiserror::Error;

/// Result type for market operations
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors raised by provider clients and market tools
#[derive(Error, Debug)]
pub enum MarketError {
    /// Provider answered with a non-success status
    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: &'static str },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    #[error("Failed to parse {provider} response: {reason}")]
    Malformed {
        provider: &'static str,
        reason: String,
    },

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("No data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// A provider needs a key that is not configured
    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("Indicator error: {0}")]
    Indicator(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for MarketError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<MarketError> for ToolError {
    fn from(err: MarketError) -> Self {
        let message = err.to_string();
        match err {
            MarketError::Network(_) => Self::Network(message),
            MarketError::RateLimitExceeded { .. } => Self::RateLimited(message),
            MarketError::Api { status: 429, .. } => Self::RateLimited(message),
            MarketError::Malformed { .. } => Self::MalformedResponse(message),
            MarketError::InvalidSymbol(_) => Self::InvalidArguments(message),
            MarketError::Api { .. }
            | MarketError::YahooFinance(_)
            | MarketError::DataUnavailable { .. }
            | MarketError::MissingApiKey(_)
            | MarketError::Indicator(_)
            | MarketError::Config(_) => Self::Unavailable(message),
        }
    }
}

impl From<MarketError> for agent_core::Error {
    fn from(err: MarketError) -> Self {
        Self::InitializationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_mapping() {
        let err: ToolError = MarketError::RateLimitExceeded { provider: "finnhub" }.into();
        assert_eq!(err, ToolError::RateLimited("Rate limit exceeded for finnhub".into()));

        let err: ToolError = MarketError::Api {
            provider: "tavily",
            status: 429,
            body: "slow down".into(),
        }
        .into();
        assert!(matches!(err, ToolError::RateLimited(_)));

        let err: ToolError = MarketError::Malformed {
            provider: "alternative.me",
            reason: "missing data".into(),
        }
        .into();
        assert!(matches!(err, ToolError::MalformedResponse(_)));

        let err: ToolError = MarketError::MissingApiKey("TAVILY_API_KEY").into();
        assert_eq!(err.to_string(), "Data unavailable: TAVILY_API_KEY is not set");
    }
}
