//! Stock and crypto orchestrators assembled from the generic engine

use agent_core::{Error, Result, Route};
use agent_llm::LLMProvider;
use agent_tools::ToolRegistry;
use agent_workflow::{
    LlmReasoner, LlmRouteClassifier, LlmSynthesizer, Orchestrator, OrchestratorBuilder,
    OrchestratorConfig, RouteClassifier, Worker,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{
    FearGreedClient, FinnhubClient, NewsArticle, NewsSource, PriceSource,
    SearchProvider, SearchResponse, SentimentIndex, TavilyClient, YahooFinanceClient,
};
use crate::cache::CacheService;
use crate::config::MarketConfig;
use crate::error::MarketError;
use crate::prompts;
use crate::router::KeywordRouteClassifier;
use crate::tools::{
    FearGreedTool, IndicatorTool, NewsSentimentTool, QuoteTool, SymbolStyle, WebSearchTool,
};

/// Asset class an orchestrator answers questions about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Stock,
    Crypto,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Crypto => "crypto",
        }
    }

    pub fn symbol_style(&self) -> SymbolStyle {
        match self {
            Self::Stock => SymbolStyle::Equity,
            Self::Crypto => SymbolStyle::Crypto,
        }
    }

    /// Tools bound to `route` in this domain
    pub fn tools(&self, route: Route, services: &MarketServices) -> ToolRegistry {
        let style = self.symbol_style();
        let cache = services.cache.clone();
        match (self, route) {
            (_, Route::Technical) => ToolRegistry::new()
                .with(Arc::new(QuoteTool::new(
                    services.prices.clone(),
                    cache.clone(),
                    style,
                )))
                .with(Arc::new(IndicatorTool::new(
                    services.prices.clone(),
                    cache,
                    style,
                    services.config.history_days,
                ))),
            (Self::Stock, Route::Sentiment) => {
                ToolRegistry::new().with(Arc::new(NewsSentimentTool::new(
                    services.news.clone(),
                    cache,
                    services.config.news_lookback_days,
                )))
            }
            (Self::Crypto, Route::Sentiment) => ToolRegistry::new()
                .with(Arc::new(FearGreedTool::new(services.sentiment.clone(), cache))),
            (_, Route::Research) => ToolRegistry::new()
                .with(Arc::new(WebSearchTool::new(services.search.clone(), cache))),
            (_, Route::Finish) => ToolRegistry::new(),
        }
    }

    /// Builder with every worker, the classifier and the synthesizer wired
    pub fn builder(
        &self,
        provider: Arc<dyn LLMProvider>,
        services: &MarketServices,
        config: OrchestratorConfig,
        kind: ClassifierKind,
    ) -> Result<OrchestratorBuilder> {
        let classifier: Arc<dyn RouteClassifier> = match kind {
            ClassifierKind::Llm => Arc::new(LlmRouteClassifier::new(
                provider.clone(),
                prompts::supervisor(*self)?,
                &config,
            )),
            ClassifierKind::Keyword => Arc::new(KeywordRouteClassifier::new()),
        };

        let mut builder = Orchestrator::builder()
            .classifier(classifier)
            .synthesizer(Arc::new(LlmSynthesizer::new(
                provider.clone(),
                prompts::synthesis(*self)?,
                &config,
            )));

        for route in Route::WORKERS {
            let prompt = prompts::worker(*self, route)?;
            let reasoner = LlmReasoner::new(provider.clone(), prompt, &config);
            builder = builder.worker(Worker::new(
                route,
                self.tools(route, services),
                Arc::new(reasoner),
            ));
        }

        info!(domain = %self, classifier = ?kind, "Assembled orchestrator");
        Ok(builder.config(config))
    }

    /// Ready-to-run orchestrator for this domain
    pub fn orchestrator(
        &self,
        provider: Arc<dyn LLMProvider>,
        services: &MarketServices,
        config: OrchestratorConfig,
        classifier: ClassifierKind,
    ) -> Result<Orchestrator> {
        self.builder(provider, services, config, classifier)?.build()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stock" | "stocks" | "equity" => Ok(Self::Stock),
            "crypto" | "cryptocurrency" => Ok(Self::Crypto),
            other => Err(Error::Configuration(format!(
                "unknown domain '{other}' (expected stock or crypto)"
            ))),
        }
    }
}

/// How the supervisor picks the next worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Forced `route` tool call on the language model
    #[default]
    Llm,
    /// Offline keyword rules
    Keyword,
}

/// Provider clients and the cache shared by every tool of a process
#[derive(Clone)]
pub struct MarketServices {
    pub prices: Arc<dyn PriceSource>,
    pub news: Arc<dyn NewsSource>,
    pub sentiment: Arc<dyn SentimentIndex>,
    pub search: Arc<dyn SearchProvider>,
    pub cache: CacheService,
    pub config: MarketConfig,
}

impl MarketServices {
    /// Live clients; a provider without its API key answers every call
    /// with a missing-key error
    pub fn from_config(config: MarketConfig) -> std::result::Result<Self, MarketError> {
        config.validate()?;
        let timeout = config.request_timeout;

        let news: Arc<dyn NewsSource> = match &config.finnhub_api_key {
            Some(key) => Arc::new(FinnhubClient::new(key, config.finnhub_rate_limit, timeout)?),
            None => {
                warn!("FINNHUB_API_KEY not set, news sentiment unavailable");
                Arc::new(MissingKey("FINNHUB_API_KEY"))
            }
        };
        let search: Arc<dyn SearchProvider> = match &config.tavily_api_key {
            Some(key) => Arc::new(TavilyClient::new(key, config.tavily_rate_limit, timeout)?),
            None => {
                warn!("TAVILY_API_KEY not set, web search unavailable");
                Arc::new(MissingKey("TAVILY_API_KEY"))
            }
        };

        Ok(Self {
            prices: Arc::new(YahooFinanceClient::new(config.yahoo_rate_limit)),
            news,
            sentiment: Arc::new(FearGreedClient::new(config.fear_greed_rate_limit, timeout)?),
            search,
            cache: CacheService::from_config(&config),
            config,
        })
    }
}

/// Stands in for a provider whose API key is not configured
struct MissingKey(&'static str);

#[async_trait]
impl NewsSource for MissingKey {
    async fn company_news(
        &self,
        _symbol: &str,
        _days: i64,
    ) -> std::result::Result<Vec<NewsArticle>, MarketError> {
        Err(MarketError::MissingApiKey(self.0))
    }
}

#[async_trait]
impl SearchProvider for MissingKey {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> std::result::Result<SearchResponse, MarketError> {
        Err(MarketError::MissingApiKey(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        MockNewsSource, MockPriceSource, MockSearchProvider, MockSentimentIndex, Quote,
    };
    use agent_llm::{
        CompletionRequest, CompletionResponse, ContentBlock, Message, StopReason, TokenUsage,
    };
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Calls every offered tool with fixed arguments; answers in text when
    /// no tools are offered
    struct ToolCallingModel {
        arguments: fn(&str) -> Value,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ToolCallingModel {
        fn new(arguments: fn(&str) -> Value) -> Self {
            Self {
                arguments,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for ToolCallingModel {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> agent_llm::Result<CompletionResponse> {
            let blocks: Vec<ContentBlock> = match &request.tools {
                Some(tools) => tools
                    .iter()
                    .map(|t| ContentBlock::ToolUse {
                        id: format!("toolu_{}", t.name),
                        name: t.name.clone(),
                        input: (self.arguments)(&t.name),
                    })
                    .collect(),
                None => vec![ContentBlock::text("BTC is trading at $67,000.50.")],
            };
            let stop_reason = if request.tools.is_some() {
                StopReason::ToolUse
            } else {
                StopReason::EndTurn
            };
            self.requests.lock().unwrap().push(request);
            Ok(CompletionResponse {
                message: Message::assistant_blocks(blocks),
                stop_reason,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "tool-calling"
        }
    }

    fn btc_quote(symbol: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            open: 66000.0,
            high: 67500.0,
            low: 65800.0,
            close: 67000.5,
            volume: 42,
            adjclose: 67000.5,
        }
    }

    fn services(prices: MockPriceSource) -> MarketServices {
        MarketServices {
            prices: Arc::new(prices),
            news: Arc::new(MockNewsSource::new()),
            sentiment: Arc::new(MockSentimentIndex::new()),
            search: Arc::new(MockSearchProvider::new()),
            cache: CacheService::new(Duration::from_secs(60)),
            config: MarketConfig::default(),
        }
    }

    #[test]
    fn test_domain_parse() {
        assert_eq!("Crypto".parse::<Domain>().unwrap(), Domain::Crypto);
        assert_eq!(" stocks ".parse::<Domain>().unwrap(), Domain::Stock);
        assert!(matches!("forex".parse::<Domain>(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_tool_bindings() {
        let services = services(MockPriceSource::new());
        let names = |domain: Domain, route: Route| -> Vec<String> {
            domain
                .tools(route, &services)
                .names()
                .map(str::to_string)
                .collect()
        };

        for domain in [Domain::Stock, Domain::Crypto] {
            assert_eq!(names(domain, Route::Technical), vec!["get_indicators", "get_quote"]);
            assert_eq!(names(domain, Route::Research), vec!["web_search"]);
        }
        assert_eq!(names(Domain::Stock, Route::Sentiment), vec!["get_news_sentiment"]);
        assert_eq!(names(Domain::Crypto, Route::Sentiment), vec!["get_fear_greed"]);
    }

    #[tokio::test]
    async fn test_missing_key_is_reported() {
        let err = MissingKey("TAVILY_API_KEY").search("anything", 3).await.unwrap_err();
        assert!(matches!(err, MarketError::MissingApiKey("TAVILY_API_KEY")));
    }

    #[tokio::test]
    async fn test_crypto_price_question_end_to_end() {
        let mut prices = MockPriceSource::new();
        prices
            .expect_latest_quote()
            .withf(|symbol| symbol == "BTC-USD")
            .times(1)
            .returning(|s| Ok(btc_quote(s)));

        let model = Arc::new(ToolCallingModel::new(|tool| match tool {
            "get_quote" => json!({"symbol": "BTC"}),
            _ => json!({}),
        }));
        let orchestrator = Domain::Crypto
            .builder(
                model.clone(),
                &services(prices),
                OrchestratorConfig::default(),
                ClassifierKind::Keyword,
            )
            .unwrap()
            .build()
            .unwrap();

        let report = orchestrator.run_report("What is the price of BTC?").await.unwrap();

        assert_eq!(report.answer, "BTC is trading at $67,000.50.");
        assert_eq!(report.state.visit_count(), 1);
        assert_eq!(report.state.get("technical", "get_quote").unwrap()["price"], 67000.5);
        // the indicator call had no arguments and failed without ending the run
        assert!(report.state.get("technical", "get_indicators").unwrap()["error"].is_string());

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let offered: Vec<&str> = requests[0]
            .tools
            .as_ref()
            .unwrap()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(offered, vec!["get_indicators", "get_quote"]);
        assert!(requests[1].tools.is_none());
    }
}
