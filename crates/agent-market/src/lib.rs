//! Stock and crypto market analysis on the supervisor/worker orchestrator
//!
//! This crate binds the generic engine in `agent_workflow` to market data:
//!
//! - Provider clients for Yahoo Finance, Finnhub company news, the
//!   alternative.me Fear & Greed Index and Tavily web search
//! - Tools for quotes, technical indicators, news sentiment, the Fear &
//!   Greed Index and web search, each behind a TTL cache
//! - Domain prompts for the supervisor, the three workers and synthesis
//! - An offline keyword classifier usable in place of the model-backed one
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_market::{ClassifierKind, Domain, MarketConfig, MarketServices};
//! use agent_workflow::OrchestratorConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Arc::new(agent_llm::providers::AnthropicProvider::from_env()?);
//!     let services = MarketServices::from_config(MarketConfig::from_env()?)?;
//!
//!     let orchestrator = Domain::Crypto.orchestrator(
//!         provider,
//!         &services,
//!         OrchestratorConfig::from_env()?,
//!         ClassifierKind::Llm,
//!     )?;
//!
//!     println!("{}", orchestrator.run("What is the price of BTC?").await?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod prompts;
pub mod router;
pub mod tools;

pub use cache::{CacheEntry, CacheKey, CacheService};
pub use config::{MarketConfig, MarketConfigBuilder};
pub use domain::{ClassifierKind, Domain, MarketServices};
pub use error::{MarketError, Result};
pub use router::{KeywordRouteClassifier, QueryPlan};
pub use tools::{
    FearGreedTool, IndicatorTool, NewsSentimentTool, QuoteTool, SymbolStyle, WebSearchTool,
};
