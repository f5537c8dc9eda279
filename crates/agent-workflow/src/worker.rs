//! Worker execution pattern
//!
//! A worker is a route bound to a fixed capability set. One visit is one
//! reasoning step, then (if the step asked for tools) one pass through the
//! bridge. All state changes happen after the last await, so a visit either
//! lands completely or, when cancelled, not at all.

use crate::cancel::guarded;
use crate::config::OrchestratorConfig;
use crate::prompt::{PromptTemplate, data_json, transcript};
use agent_core::{DataMap, Error, Message, Result, Route, State, ToolCall, ToolResult};
use agent_llm::{CompletionRequest, LLMProvider, Message as LlmMessage, ToolChoice, ToolDefinition};
use agent_tools::{ToolBridge, ToolExecution, ToolRegistry};
use async_trait::async_trait;
use minijinja::context;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// What a reasoning step sees
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningInput {
    pub route: Route,
    pub query: String,
    pub data: DataMap,
    pub messages: Vec<Message>,
    /// The worker's capability set, as offered to the model
    pub tools: Vec<ToolDefinition>,
}

/// Output of one reasoning step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasoningStep {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ReasoningStep {
    pub fn commentary(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: String::new(),
            tool_calls,
        }
    }
}

/// Produces a worker's reasoning step
#[async_trait]
pub trait WorkerReasoner: Send + Sync {
    async fn reason(&self, input: &ReasoningInput) -> Result<ReasoningStep>;
}

/// Reasoner backed by a language model, offered only the worker's tools
pub struct LlmReasoner {
    provider: Arc<dyn LLMProvider>,
    prompt: PromptTemplate,
    model: String,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl LlmReasoner {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        prompt: PromptTemplate,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            prompt,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl WorkerReasoner for LlmReasoner {
    async fn reason(&self, input: &ReasoningInput) -> Result<ReasoningStep> {
        let tool_names: Vec<&str> = input.tools.iter().map(|t| t.name.as_str()).collect();
        let system = self
            .prompt
            .render(context! {
                query => &input.query,
                category => input.route.as_str(),
                tools => tool_names,
            })
            .map_err(|e| Error::Reasoning(format!("prompt render failed: {e}")))?;

        let mut user = format!("User question: {}\n\n", input.query);
        user.push_str("Data collected so far:\n");
        user.push_str(&data_json(&input.data));
        user.push_str("\n\nConversation so far:\n");
        user.push_str(&transcript(&input.messages));

        let mut request = CompletionRequest::builder(&self.model)
            .system(system)
            .add_message(LlmMessage::user(user))
            .max_tokens(self.max_tokens)
            .tools(input.tools.clone())
            .tool_choice(ToolChoice::Auto);
        if let Some(t) = self.temperature {
            request = request.temperature(t);
        }

        let response = self
            .provider
            .complete(request.build())
            .await
            .map_err(|e| Error::Reasoning(e.to_string()))?;

        let tool_calls = response
            .message
            .tool_uses()
            .map(|(name, arguments)| ToolCall::new(name, arguments.clone()))
            .collect();

        Ok(ReasoningStep {
            text: response.text().trim().to_string(),
            tool_calls,
        })
    }
}

/// What a visit produced, for observers
#[derive(Debug, Clone, Default)]
pub struct VisitOutcome {
    pub results: Vec<ToolResult>,
    /// Set when the visit ended without tool calls
    pub commentary: Option<String>,
}

/// A route bound to a capability set and a reasoner
pub struct Worker {
    route: Route,
    tools: ToolRegistry,
    reasoner: Arc<dyn WorkerReasoner>,
    bridge: ToolBridge,
}

impl Worker {
    pub fn new(route: Route, tools: ToolRegistry, reasoner: Arc<dyn WorkerReasoner>) -> Self {
        Self {
            route,
            tools,
            reasoner,
            bridge: ToolBridge::default(),
        }
    }

    /// Schedule this worker's tool calls with `execution`
    pub fn with_execution(mut self, execution: ToolExecution) -> Self {
        self.bridge = ToolBridge::new(execution);
        self
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one visit against `state`
    ///
    /// Always counts exactly one visit on success. Reasoning and tool
    /// failures are folded into `state`; only cancellation is returned as an
    /// error, and then `state` is unchanged.
    #[instrument(skip_all, fields(route = %self.route, visit = state.visit_count() + 1))]
    pub async fn visit(&self, state: &mut State, cancel: &CancellationToken) -> Result<VisitOutcome> {
        let input = ReasoningInput {
            route: self.route,
            query: state.query().to_string(),
            data: state.data().clone(),
            messages: state.messages().to_vec(),
            tools: self.tools.definitions(),
        };

        let step = match guarded(cancel, self.reasoner.reason(&input)).await? {
            Ok(step) => step,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Reasoning step failed");
                let note = format!("{} analysis unavailable: {e}", self.route);
                return Ok(self.finish_with_commentary(state, note));
            }
        };

        if step.tool_calls.is_empty() {
            debug!("Reasoning step requested no tools");
            let note = if step.text.is_empty() {
                format!("{} analysis produced no findings", self.route)
            } else {
                step.text
            };
            return Ok(self.finish_with_commentary(state, note));
        }

        let results = guarded(cancel, self.bridge.invoke(&self.tools, &step.tool_calls)).await?;

        let failures = results.iter().filter(|r| r.output.is_failure()).count();
        info!(
            tool_calls = results.len(),
            failures,
            "Merging tool results"
        );

        state.push_message(
            Message::agent(self.route.as_str(), step.text).with_tool_calls(step.tool_calls),
        );
        state.merge(self.route.as_str(), results.clone());
        state.record_visit();

        Ok(VisitOutcome {
            results,
            commentary: None,
        })
    }

    fn finish_with_commentary(&self, state: &mut State, note: String) -> VisitOutcome {
        state.push_message(Message::agent(self.route.as_str(), note.clone()));
        state.record_visit();
        VisitOutcome {
            results: Vec::new(),
            commentary: Some(note),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallingReasoner, FailingReasoner, ScriptedProvider, StaticTool};
    use agent_llm::LLMError;
    use serde_json::json;

    fn technical_tools() -> ToolRegistry {
        ToolRegistry::new()
            .with(Arc::new(StaticTool::new("get_quote", json!({"price": 187.2}))))
            .with(Arc::new(StaticTool::new("get_indicators", json!({"rsi": 61.0}))))
    }

    #[tokio::test]
    async fn test_tool_results_merge_under_category() {
        let reasoner = CallingReasoner::calls(vec![
            ToolCall::new("get_quote", json!({"symbol": "AAPL"})),
            ToolCall::new("get_indicators", json!({"symbol": "AAPL", "indicators": ["rsi"]})),
        ]);
        let worker = Worker::new(Route::Technical, technical_tools(), Arc::new(reasoner));
        let mut state = State::new("Analyze AAPL");

        let outcome = worker.visit(&mut state, &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.commentary.is_none());
        assert_eq!(state.visit_count(), 1);
        assert_eq!(state.get("technical", "get_quote"), Some(&json!({"price": 187.2})));
        assert_eq!(state.get("technical", "get_indicators"), Some(&json!({"rsi": 61.0})));

        let last = state.messages().last().unwrap();
        assert_eq!(last.sender.as_deref(), Some("technical"));
        assert_eq!(last.tool_calls.len(), 2);
    }

    #[tokio::test]
    async fn test_commentary_visit_still_counts() {
        let worker = Worker::new(
            Route::Research,
            ToolRegistry::new(),
            Arc::new(CallingReasoner::silent("Nothing further to look up.")),
        );
        let mut state = State::new("q");

        let outcome = worker.visit(&mut state, &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.commentary.as_deref(), Some("Nothing further to look up."));
        assert_eq!(state.visit_count(), 1);
        assert!(state.data().is_empty());
        assert_eq!(state.messages().last().unwrap().content, "Nothing further to look up.");
    }

    #[tokio::test]
    async fn test_reasoning_failure_becomes_commentary() {
        let worker = Worker::new(
            Route::Sentiment,
            ToolRegistry::new(),
            Arc::new(FailingReasoner(|| Error::Reasoning("provider down".to_string()))),
        );
        let mut state = State::new("q");

        let outcome = worker.visit(&mut state, &CancellationToken::new()).await.unwrap();

        assert_eq!(state.visit_count(), 1);
        assert!(outcome.commentary.unwrap().contains("provider down"));
    }

    #[tokio::test]
    async fn test_cancelled_visit_leaves_state_untouched() {
        let worker = Worker::new(
            Route::Technical,
            technical_tools(),
            Arc::new(CallingReasoner::calls(vec![ToolCall::new("get_quote", json!({}))])),
        );
        let mut state = State::new("q");
        let token = CancellationToken::new();
        token.cancel();

        let err = worker.visit(&mut state, &token).await.unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(state.visit_count(), 0);
        assert_eq!(state.messages().len(), 1);
        assert!(state.data().is_empty());
    }

    #[tokio::test]
    async fn test_tool_outside_capability_set() {
        let worker = Worker::new(
            Route::Technical,
            technical_tools(),
            Arc::new(CallingReasoner::calls(vec![ToolCall::new("web_search", json!({"query": "x"}))])),
        );
        let mut state = State::new("q");

        worker.visit(&mut state, &CancellationToken::new()).await.unwrap();

        assert_eq!(
            state.get("technical", "web_search"),
            Some(&json!({"error": "Unknown tool: web_search"}))
        );
    }

    #[tokio::test]
    async fn test_llm_reasoner_offers_only_capability_set() {
        let provider = Arc::new(ScriptedProvider::new().tool_use_with_text(
            "Fetching the quote.",
            "get_quote",
            json!({"symbol": "BTC"}),
        ));
        let prompt =
            PromptTemplate::new("technical", "You handle {{ category }} with {{ tools | join(',') }}")
                .unwrap();
        let reasoner = LlmReasoner::new(provider.clone(), prompt, &OrchestratorConfig::default());
        let worker = Worker::new(Route::Technical, technical_tools(), Arc::new(reasoner));
        let mut state = State::new("What is the price of BTC?");

        worker.visit(&mut state, &CancellationToken::new()).await.unwrap();

        let request = &provider.requests()[0];
        let offered: Vec<_> = request
            .tools
            .as_ref()
            .unwrap()
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(offered, vec!["get_indicators", "get_quote"]);
        assert_eq!(
            request.system.as_deref(),
            Some("You handle technical with get_indicators,get_quote")
        );
        assert_eq!(state.get("technical", "get_quote"), Some(&json!({"price": 187.2})));
        assert_eq!(state.messages().last().unwrap().content, "Fetching the quote.");
    }

    #[tokio::test]
    async fn test_llm_reasoner_sees_earlier_notes() {
        let provider = Arc::new(ScriptedProvider::new().text("Nothing to add."));
        let prompt = PromptTemplate::new("research", "research").unwrap();
        let reasoner = LlmReasoner::new(provider.clone(), prompt, &OrchestratorConfig::default());
        let worker = Worker::new(Route::Research, ToolRegistry::new(), Arc::new(reasoner));
        let mut state = State::new("Analyze TSLA");
        state.push_message(Message::agent("sentiment", "Headlines lean bearish on deliveries."));

        worker.visit(&mut state, &CancellationToken::new()).await.unwrap();

        let user = provider.requests()[0].messages[0].text();
        assert!(user.contains("[user] Analyze TSLA"), "{user}");
        assert!(user.contains("[sentiment] Headlines lean bearish on deliveries."), "{user}");
    }

    #[tokio::test]
    async fn test_llm_reasoner_error_is_recorded() {
        let provider = Arc::new(
            ScriptedProvider::new().error(LLMError::RateLimitExceeded("slow down".to_string())),
        );
        let prompt = PromptTemplate::new("research", "research").unwrap();
        let reasoner = LlmReasoner::new(provider, prompt, &OrchestratorConfig::default());
        let worker = Worker::new(Route::Research, ToolRegistry::new(), Arc::new(reasoner));
        let mut state = State::new("q");

        let outcome = worker.visit(&mut state, &CancellationToken::new()).await.unwrap();

        assert_eq!(state.visit_count(), 1);
        assert!(outcome.commentary.unwrap().contains("Rate limit exceeded"));
    }
}
