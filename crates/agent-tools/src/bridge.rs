//! Tool invocation bridge
//!
//! Executes the tool calls of one reasoning step against a worker's
//! capability set. Every call yields exactly one [`ToolResult`], in the
//! order the calls were requested; nothing raised by a tool (error or
//! panic) escapes.

use crate::{ToolError, ToolRegistry};
use agent_core::{ToolCall, ToolResult};
use futures::FutureExt;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, info, warn};

const PREVIEW_CHARS: usize = 300;

/// Scheduling of the calls inside one visit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolExecution {
    /// All calls in flight at once
    #[default]
    Concurrent,
    /// One call at a time, in request order
    Sequential,
}

/// Runs tool calls and normalises their outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolBridge {
    execution: ToolExecution,
}

impl ToolBridge {
    pub fn new(execution: ToolExecution) -> Self {
        Self { execution }
    }

    pub fn execution(&self) -> ToolExecution {
        self.execution
    }

    /// Execute `calls` against `registry`
    ///
    /// Results line up with `calls` by index regardless of scheduling, so a
    /// later merge sees duplicates in call order.
    pub async fn invoke(&self, registry: &ToolRegistry, calls: &[ToolCall]) -> Vec<ToolResult> {
        if calls.is_empty() {
            return Vec::new();
        }

        info!(
            call_count = calls.len(),
            execution = ?self.execution,
            "Starting tool execution"
        );

        match self.execution {
            ToolExecution::Concurrent => {
                join_all(calls.iter().map(|call| invoke_one(registry, call))).await
            }
            ToolExecution::Sequential => {
                let mut results = Vec::with_capacity(calls.len());
                for call in calls {
                    results.push(invoke_one(registry, call).await);
                }
                results
            }
        }
    }
}

async fn invoke_one(registry: &ToolRegistry, call: &ToolCall) -> ToolResult {
    let Some(tool) = registry.get(&call.name) else {
        warn!(tool_name = %call.name, "Tool is not in this capability set");
        return ToolResult::failure(&call.name, ToolError::UnknownTool(call.name.clone()).to_string());
    };

    debug!(
        tool_name = %call.name,
        input_preview = %preview(&call.arguments.to_string()),
        "Executing tool"
    );

    let start = Instant::now();
    let outcome = AssertUnwindSafe(tool.execute(call.arguments.clone()))
        .catch_unwind()
        .await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(payload)) => {
            info!(
                tool_name = %call.name,
                duration_ms,
                result_preview = %preview(&payload.to_string()),
                "Tool execution succeeded"
            );
            ToolResult::success(&call.name, payload)
        }
        Ok(Err(error)) => {
            warn!(tool_name = %call.name, duration_ms, error = %error, "Tool execution failed");
            ToolResult::failure(&call.name, error.to_string())
        }
        Err(_) => {
            warn!(tool_name = %call.name, duration_ms, "Tool panicked");
            ToolResult::failure(&call.name, format!("tool '{}' panicked", call.name))
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
