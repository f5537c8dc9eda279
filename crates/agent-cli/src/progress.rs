//! Step-by-step progress on stderr

use agent_core::{Route, RoutingDecision, ToolOutput, ToolResult};
use agent_workflow::OrchestratorEventHandler;
use async_trait::async_trait;
use uuid::Uuid;

/// Prints each routing decision and tool outcome as the run advances
#[derive(Debug, Default)]
pub struct ProgressPrinter;

impl ProgressPrinter {
    pub fn new() -> Self {
        Self
    }
}

fn route_line(decision: &RoutingDecision, forced: bool) -> String {
    match (decision.next, forced) {
        (Route::Finish, true) => "-> finish (visit limit reached)".to_string(),
        (next, _) => format!("-> {next}: {}", decision.reasoning),
    }
}

fn tool_line(result: &ToolResult) -> String {
    match &result.output {
        ToolOutput::Success(_) => format!("   ok   {}", result.tool_name),
        ToolOutput::Failure { error } => format!("   fail {}: {error}", result.tool_name),
    }
}

#[async_trait]
impl OrchestratorEventHandler for ProgressPrinter {
    async fn on_route(&self, _run_id: Uuid, decision: &RoutingDecision, forced: bool) {
        eprintln!("{}", route_line(decision, forced));
    }

    async fn on_tool_result(&self, _run_id: Uuid, _route: Route, result: &ToolResult) {
        eprintln!("{}", tool_line(result));
    }
}
