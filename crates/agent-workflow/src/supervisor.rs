//! Supervisor: picks the next worker or finishes the run
//!
//! The visit bound is checked before the classifier is consulted, so once
//! the budget is spent no classification call is made at all. Whatever the
//! classifier returns must name a registered worker or `finish`; anything
//! else fails the run.

use crate::cancel::guarded;
use crate::config::OrchestratorConfig;
use crate::policy::TerminationPolicy;
use crate::prompt::{PromptTemplate, data_json, transcript};
use agent_core::{DataMap, Error, Message, Result, Route, RoutingDecision, State};
use agent_llm::tools::schema;
use agent_llm::{CompletionRequest, LLMProvider, Message as LlmMessage, ToolChoice, ToolDefinition};
use async_trait::async_trait;
use minijinja::context;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sender name on routing commentary messages
pub const SUPERVISOR_SENDER: &str = "supervisor";

/// Everything a classifier may look at
#[derive(Debug, Clone, Serialize)]
pub struct RoutingInput {
    pub query: String,
    pub data: DataMap,
    pub recent_messages: Vec<Message>,
    pub visit_count: usize,
    pub max_visits: usize,
    /// Worker routes registered for this run
    pub available: Vec<Route>,
}

impl RoutingInput {
    pub fn from_state(
        state: &State,
        recent_messages: usize,
        max_visits: usize,
        available: &[Route],
    ) -> Self {
        Self {
            query: state.query().to_string(),
            data: state.data().clone(),
            recent_messages: state.recent_messages(recent_messages).to_vec(),
            visit_count: state.visit_count(),
            max_visits,
            available: available.to_vec(),
        }
    }
}

/// Maps the run so far onto one routing target
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteClassifier: Send + Sync {
    async fn classify(&self, input: &RoutingInput) -> Result<RoutingDecision>;
}

/// Classifier backed by a language model with a forced `route` tool call
pub struct LlmRouteClassifier {
    provider: Arc<dyn LLMProvider>,
    prompt: PromptTemplate,
    model: String,
    max_tokens: usize,
}

impl LlmRouteClassifier {
    /// Name of the structured-output tool the model is forced to call
    pub const TOOL_NAME: &'static str = "route";

    pub fn new(
        provider: Arc<dyn LLMProvider>,
        prompt: PromptTemplate,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            prompt,
            model: config.model.clone(),
            max_tokens: config.max_tokens.min(512),
        }
    }

    /// `route` tool whose `next` field is a closed enum of the allowed targets
    pub fn route_tool(available: &[Route]) -> ToolDefinition {
        let mut targets: Vec<&str> = available.iter().map(Route::as_str).collect();
        targets.push(Route::Finish.as_str());

        ToolDefinition::new(
            Self::TOOL_NAME,
            "Choose the next step for answering the user's question.",
            schema::object(
                json!({
                    "next": schema::enumeration("Worker to run next, or finish", &targets),
                    "reasoning": schema::string("One sentence explaining the choice"),
                }),
                &["next", "reasoning"],
            ),
        )
    }

    fn render_system(&self, input: &RoutingInput) -> Result<String> {
        let routes: Vec<&str> = input.available.iter().map(Route::as_str).collect();
        self.prompt
            .render(context! {
                query => &input.query,
                routes => routes,
                visit_count => input.visit_count,
                max_visits => input.max_visits,
                remaining => input.max_visits.saturating_sub(input.visit_count),
            })
            .map_err(|e| Error::RoutingClassification(format!("prompt render failed: {e}")))
    }
}

#[async_trait]
impl RouteClassifier for LlmRouteClassifier {
    async fn classify(&self, input: &RoutingInput) -> Result<RoutingDecision> {
        let system = self.render_system(input)?;

        let request = CompletionRequest::builder(&self.model)
            .system(system)
            .add_message(LlmMessage::user(routing_transcript(input)))
            .max_tokens(self.max_tokens)
            .tools(vec![Self::route_tool(&input.available)])
            .temperature(0.0)
            .tool_choice(ToolChoice::tool(Self::TOOL_NAME))
            .build();

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| Error::RoutingClassification(format!("classifier call failed: {e}")))?;

        let decoded = match response.tool_input(Self::TOOL_NAME) {
            Some(input) => RoutingDecision::decode(input),
            None => {
                debug!("Classifier answered without a tool call, decoding text");
                RoutingDecision::decode_str(&response.text())
            }
        };

        decoded.map_err(|e| Error::RoutingClassification(e.to_string()))
    }
}

/// Serialized `(query, data, recent messages, visit count)` for the classifier
fn routing_transcript(input: &RoutingInput) -> String {
    let mut text = format!("User question: {}\n\n", input.query);
    text.push_str(&format!(
        "Worker visits used: {} of {}\n\n",
        input.visit_count, input.max_visits
    ));
    text.push_str("Collected data:\n");
    text.push_str(&data_json(&input.data));
    text.push_str("\n\nRecent messages:\n");
    text.push_str(&transcript(&input.recent_messages));
    text
}

/// Result of one Supervisor visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorOutcome {
    pub decision: RoutingDecision,
    /// The visit bound overrode the classifier
    pub forced: bool,
}

/// Routing node of the state machine
pub struct Supervisor {
    classifier: Arc<dyn RouteClassifier>,
    policy: TerminationPolicy,
    recent_messages: usize,
}

impl Supervisor {
    pub fn new(
        classifier: Arc<dyn RouteClassifier>,
        policy: TerminationPolicy,
        recent_messages: usize,
    ) -> Self {
        Self {
            classifier,
            policy,
            recent_messages,
        }
    }

    pub fn policy(&self) -> TerminationPolicy {
        self.policy
    }

    /// Decide the next target and record it on `state`
    ///
    /// On success exactly one commentary message has been appended and
    /// `next_target` is set. On failure `state` is untouched.
    pub async fn route(
        &self,
        state: &mut State,
        available: &[Route],
        cancel: &CancellationToken,
    ) -> Result<SupervisorOutcome> {
        let visit_count = state.visit_count();

        let outcome = if self.policy.is_exhausted(visit_count) {
            warn!(
                visit_count,
                max_visits = self.policy.max_visits(),
                "Visit limit reached, forcing finish"
            );
            SupervisorOutcome {
                decision: RoutingDecision::finish(format!(
                    "Visit limit of {} reached",
                    self.policy.max_visits()
                )),
                forced: true,
            }
        } else {
            let input = RoutingInput::from_state(
                state,
                self.recent_messages,
                self.policy.max_visits(),
                available,
            );
            let decision = guarded(cancel, self.classifier.classify(&input)).await??;

            if decision.next.is_worker() && !available.contains(&decision.next) {
                return Err(Error::RoutingClassification(format!(
                    "no worker registered for route '{}'",
                    decision.next
                )));
            }
            SupervisorOutcome {
                decision,
                forced: false,
            }
        };

        info!(
            route = %outcome.decision.next,
            visit_count,
            forced = outcome.forced,
            reasoning = %outcome.decision.reasoning,
            "Supervisor decision"
        );

        state.push_message(Message::agent(
            SUPERVISOR_SENDER,
            commentary(&outcome.decision),
        ));
        state.set_next_target(outcome.decision.next);
        Ok(outcome)
    }
}

fn commentary(decision: &RoutingDecision) -> String {
    match decision.next {
        Route::Finish => format!("Finishing: {}", decision.reasoning),
        route => format!("Routing to {route}: {}", decision.reasoning),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use agent_core::ToolResult;
    use agent_llm::LLMError;

    fn all_routes() -> Vec<Route> {
        Route::WORKERS.to_vec()
    }

    fn config() -> OrchestratorConfig {
        OrchestratorConfig::default()
    }

    fn supervisor_prompt() -> PromptTemplate {
        PromptTemplate::new(
            "supervisor",
            "Route {{ query }} among {{ routes | join(', ') }} ({{ remaining }} left)",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_bound_forces_finish_without_classifying() {
        let mut classifier = MockRouteClassifier::new();
        classifier.expect_classify().times(0);

        let supervisor = Supervisor::new(Arc::new(classifier), TerminationPolicy::new(1), 6);
        let mut state = State::new("Analyze TSLA");
        state.record_visit();

        let outcome = supervisor
            .route(&mut state, &all_routes(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.forced);
        assert_eq!(outcome.decision.next, Route::Finish);
        assert_eq!(state.next_target(), Some(Route::Finish));
    }

    #[tokio::test]
    async fn test_decision_recorded_on_state() {
        let mut classifier = MockRouteClassifier::new();
        classifier
            .expect_classify()
            .times(1)
            .returning(|input| {
                assert_eq!(input.visit_count, 0);
                assert_eq!(input.max_visits, 3);
                Ok(RoutingDecision::new(Route::Technical, "need a price"))
            });

        let supervisor = Supervisor::new(Arc::new(classifier), TerminationPolicy::default(), 6);
        let mut state = State::new("What is the price of BTC?");

        let outcome = supervisor
            .route(&mut state, &all_routes(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!outcome.forced);
        assert_eq!(state.next_target(), Some(Route::Technical));
        assert_eq!(state.messages().len(), 2);
        let last = &state.messages()[1];
        assert_eq!(last.sender.as_deref(), Some(SUPERVISOR_SENDER));
        assert_eq!(last.content, "Routing to technical: need a price");
    }

    #[tokio::test]
    async fn test_unregistered_route_is_rejected() {
        let mut classifier = MockRouteClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| Ok(RoutingDecision::new(Route::Research, "look it up")));

        let supervisor = Supervisor::new(Arc::new(classifier), TerminationPolicy::default(), 6);
        let mut state = State::new("q");

        let err = supervisor
            .route(&mut state, &[Route::Technical], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RoutingClassification(msg) if msg.contains("research")));
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.next_target(), None);
    }

    #[tokio::test]
    async fn test_classifier_failure_propagates() {
        let mut classifier = MockRouteClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| Err(Error::RoutingClassification("bad output".to_string())));

        let supervisor = Supervisor::new(Arc::new(classifier), TerminationPolicy::default(), 6);
        let result = supervisor
            .route(&mut State::new("q"), &all_routes(), &CancellationToken::new())
            .await;

        tokio_test::assert_err!(result);
    }

    #[test]
    fn test_routing_input_window() {
        let mut state = State::new("q");
        for i in 0..10 {
            state.push_message(Message::agent("technical", format!("note {i}")));
        }
        state.merge("technical", vec![ToolResult::success("get_quote", json!({"price": 1}))]);

        let input = RoutingInput::from_state(&state, 3, 3, &all_routes());
        assert_eq!(input.recent_messages.len(), 3);
        assert_eq!(input.recent_messages[2].content, "note 9");
        assert!(input.data.contains_key("technical"));
    }

    #[tokio::test]
    async fn test_llm_classifier_forces_route_tool() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .tool_use("route", json!({"next": "sentiment", "reasoning": "price known"})),
        );
        let classifier =
            LlmRouteClassifier::new(provider.clone(), supervisor_prompt(), &config());

        let input = RoutingInput::from_state(
            &State::new("Analyze TSLA"),
            6,
            3,
            &[Route::Technical, Route::Sentiment],
        );
        let decision = classifier.classify(&input).await.unwrap();
        assert_eq!(decision, RoutingDecision::new(Route::Sentiment, "price known"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.tool_choice, Some(ToolChoice::tool("route")));
        assert_eq!(
            request.system.as_deref(),
            Some("Route Analyze TSLA among technical, sentiment (3 left)")
        );
        let tools = request.tools.as_ref().unwrap();
        assert_eq!(
            tools[0].input_schema["properties"]["next"]["enum"],
            json!(["technical", "sentiment", "finish"])
        );
    }

    #[tokio::test]
    async fn test_llm_classifier_rejects_out_of_enum() {
        let provider = Arc::new(
            ScriptedProvider::new().tool_use("route", json!({"next": "portfolio", "reasoning": "?"})),
        );
        let classifier = LlmRouteClassifier::new(provider, supervisor_prompt(), &config());
        let input = RoutingInput::from_state(&State::new("q"), 6, 3, &all_routes());

        let err = classifier.classify(&input).await.unwrap_err();
        assert!(matches!(err, Error::RoutingClassification(msg) if msg.contains("portfolio")));
    }

    #[tokio::test]
    async fn test_llm_classifier_text_fallback() {
        let provider = Arc::new(
            ScriptedProvider::new().text(r#"{"next": "finish", "reasoning": "answered"}"#),
        );
        let classifier = LlmRouteClassifier::new(provider, supervisor_prompt(), &config());
        let input = RoutingInput::from_state(&State::new("q"), 6, 3, &all_routes());

        let decision = classifier.classify(&input).await.unwrap();
        assert_eq!(decision.next, Route::Finish);
    }

    #[tokio::test]
    async fn test_llm_classifier_free_text_is_failure() {
        let provider = Arc::new(ScriptedProvider::new().text("I think technical analysis"));
        let classifier = LlmRouteClassifier::new(provider, supervisor_prompt(), &config());
        let input = RoutingInput::from_state(&State::new("q"), 6, 3, &all_routes());

        tokio_test::assert_err!(classifier.classify(&input).await);
    }

    #[tokio::test]
    async fn test_llm_classifier_provider_error() {
        let provider = Arc::new(ScriptedProvider::new().error(LLMError::AuthenticationFailed));
        let classifier = LlmRouteClassifier::new(provider, supervisor_prompt(), &config());
        let input = RoutingInput::from_state(&State::new("q"), 6, 3, &all_routes());

        let err = classifier.classify(&input).await.unwrap_err();
        assert!(matches!(err, Error::RoutingClassification(msg) if msg.contains("classifier call failed")));
    }
}
