//! `web_search`: recent articles and context from the web

use agent_tools::{Result, Tool, ToolError, parse_args};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::api::SearchProvider;
use crate::cache::{CacheKey, CacheService};
use crate::error::MarketError;

pub const NAME: &str = "web_search";

const SNIPPET_CHARS: usize = 500;

/// Web search through the search provider
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
    cache: CacheService,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_max_results() -> usize {
    5
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>, cache: CacheService) -> Self {
        Self { provider, cache }
    }

    async fn fetch(
        &self,
        query: &str,
        max_results: usize,
    ) -> std::result::Result<Value, MarketError> {
        let response = self.provider.search(query, max_results).await?;
        let results: Vec<Value> = response
            .results
            .iter()
            .take(max_results)
            .map(|hit| {
                json!({
                    "title": hit.title,
                    "url": hit.url,
                    "snippet": truncate(&hit.content, SNIPPET_CHARS),
                })
            })
            .collect();

        Ok(json!({
            "query": query,
            "answer": response.answer,
            "results": results,
        }))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: SearchParams = parse_args(params)?;
        let query = params.query.split_whitespace().collect::<Vec<_>>().join(" ");
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("query must not be empty".to_string()));
        }
        let max_results = params.max_results.clamp(1, 10);

        let key = CacheKey::new(
            query.to_lowercase(),
            NAME,
            &json!({ "max_results": max_results }),
        );
        let entry = self
            .cache
            .get_or_fetch(key, || self.fetch(&query, max_results))
            .await?;
        Ok(entry.into_payload())
    }

    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Search the web for recent news, analysis, filings or events. \
         Use for context the market data tools cannot provide."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query, e.g. 'Tesla Q3 deliveries guidance'"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Number of results to return (1-10)",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }
}
