//! Observer hooks for orchestration runs

use agent_core::{Error, Route, RoutingDecision, ToolResult};
use async_trait::async_trait;
use uuid::Uuid;

/// Callbacks fired as a run walks the state machine
///
/// Every method has an empty default, so implementors pick the events they
/// care about (e.g. streaming progress to a UI).
#[async_trait]
pub trait OrchestratorEventHandler: Send + Sync {
    /// The Supervisor made a decision; `forced` is true when the visit
    /// bound overrode the classifier
    async fn on_route(&self, _run_id: Uuid, _decision: &RoutingDecision, _forced: bool) {}

    /// A tool called by a worker finished (successfully or not)
    async fn on_tool_result(&self, _run_id: Uuid, _route: Route, _result: &ToolResult) {}

    /// A worker visit completed
    async fn on_worker_done(&self, _run_id: Uuid, _route: Route, _visit_count: usize) {}

    /// The run produced its answer
    async fn on_complete(&self, _run_id: Uuid, _answer: &str) {}

    /// The run failed
    async fn on_error(&self, _run_id: Uuid, _error: &Error) {}
}

/// Handler that ignores every event
pub struct NoOpEventHandler;

#[async_trait]
impl OrchestratorEventHandler for NoOpEventHandler {}
