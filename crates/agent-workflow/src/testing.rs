//! Stubs shared by the unit tests of this crate

use crate::supervisor::{RouteClassifier, RoutingInput};
use crate::synthesis::Synthesizer;
use crate::worker::{ReasoningInput, ReasoningStep, WorkerReasoner};
use agent_core::{Error, Result, RoutingDecision, State, ToolCall};
use agent_llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    StopReason, TokenUsage,
};
use agent_tools::{Tool, ToolError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

// =========== LLM provider ===========

/// Replays queued responses and records every request
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<agent_llm::Result<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, response: agent_llm::Result<CompletionResponse>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    fn respond(blocks: Vec<ContentBlock>, stop_reason: StopReason) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant_blocks(blocks),
            stop_reason,
            usage: TokenUsage::default(),
        }
    }

    pub fn text(self, text: &str) -> Self {
        self.push(Ok(Self::respond(
            vec![ContentBlock::text(text)],
            StopReason::EndTurn,
        )))
    }

    pub fn tool_use(self, name: &str, input: Value) -> Self {
        self.push(Ok(Self::respond(
            vec![ContentBlock::ToolUse {
                id: format!("toolu_{name}"),
                name: name.to_string(),
                input,
            }],
            StopReason::ToolUse,
        )))
    }

    pub fn tool_use_with_text(self, text: &str, name: &str, input: Value) -> Self {
        self.push(Ok(Self::respond(
            vec![
                ContentBlock::text(text),
                ContentBlock::ToolUse {
                    id: format!("toolu_{name}"),
                    name: name.to_string(),
                    input,
                },
            ],
            StopReason::ToolUse,
        )))
    }

    pub fn error(self, error: LLMError) -> Self {
        self.push(Err(error))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::UnexpectedResponse("script exhausted".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// =========== Classifier ===========

/// Classifier driven by a closure over the routing input
pub struct FnClassifier<F>(pub F);

#[async_trait]
impl<F> RouteClassifier for FnClassifier<F>
where
    F: Fn(&RoutingInput) -> Result<RoutingDecision> + Send + Sync,
{
    async fn classify(&self, input: &RoutingInput) -> Result<RoutingDecision> {
        (self.0)(input)
    }
}

// =========== Reasoners ===========

/// Requests the same tool calls (or none) on every visit
pub struct CallingReasoner {
    calls: Vec<ToolCall>,
    text: String,
    invocations: AtomicUsize,
}

impl CallingReasoner {
    pub fn calls(calls: Vec<ToolCall>) -> Self {
        Self {
            calls,
            text: String::new(),
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn silent(text: &str) -> Self {
        Self {
            calls: Vec::new(),
            text: text.to_string(),
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerReasoner for CallingReasoner {
    async fn reason(&self, _input: &ReasoningInput) -> Result<ReasoningStep> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(ReasoningStep {
            text: self.text.clone(),
            tool_calls: self.calls.clone(),
        })
    }
}

/// Always fails with the error produced by the function
pub struct FailingReasoner(pub fn() -> Error);

#[async_trait]
impl WorkerReasoner for FailingReasoner {
    async fn reason(&self, _input: &ReasoningInput) -> Result<ReasoningStep> {
        Err((self.0)())
    }
}

// =========== Tools ===========

/// Returns a fixed payload
pub struct StaticTool {
    name: String,
    payload: Value,
}

impl StaticTool {
    pub fn new(name: &str, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            payload,
        }
    }
}

#[async_trait]
impl Tool for StaticTool {
    async fn execute(&self, _params: Value) -> agent_tools::Result<Value> {
        Ok(self.payload.clone())
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "returns a fixed payload"
    }
    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }
}

/// Returns the next payload on each call, repeating the last one
pub struct SequenceTool {
    name: String,
    payloads: Vec<Value>,
    next: AtomicUsize,
}

impl SequenceTool {
    pub fn new(name: &str, payloads: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            payloads,
            next: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Tool for SequenceTool {
    async fn execute(&self, _params: Value) -> agent_tools::Result<Value> {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        let last = self.payloads.len().saturating_sub(1);
        self.payloads
            .get(i.min(last))
            .cloned()
            .ok_or_else(|| ToolError::Unavailable("no payloads".to_string()))
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "returns payloads in sequence"
    }
    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }
}

/// Always fails
pub struct FailingTool {
    name: String,
    error: ToolError,
}

impl FailingTool {
    pub fn new(name: &str, error: ToolError) -> Self {
        Self {
            name: name.to_string(),
            error,
        }
    }
}

#[async_trait]
impl Tool for FailingTool {
    async fn execute(&self, _params: Value) -> agent_tools::Result<Value> {
        Err(self.error.clone())
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "always fails"
    }
    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }
}

// =========== Synthesizer ===========

/// Answers with the query and the compact data map
#[derive(Default)]
pub struct DataSynthesizer {
    calls: AtomicUsize,
}

impl DataSynthesizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for DataSynthesizer {
    async fn synthesize(&self, state: &State) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = serde_json::to_string(state.data())
            .map_err(|e| Error::Synthesis(e.to_string()))?;
        Ok(format!("{} => {data}", state.query()))
    }
}
