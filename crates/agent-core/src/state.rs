//! Per-run accumulator threaded through every orchestration step
//!
//! A [`State`] is created fresh for each user query and dropped once the
//! final answer is produced. Its fields are private so the only ways to
//! change it are the append/merge/increment operations below, which keep
//! messages append-only, data keys accumulating and the visit count
//! monotonic.

use crate::route::Route;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Category name -> tool name -> last payload
pub type DataMap = BTreeMap<String, BTreeMap<String, Value>>;

/// Author of a message in the run transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A tool invocation requested by a reasoning step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// One entry in the run transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Which node wrote the message ("supervisor", "technical", ...), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            sender: None,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn agent(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            sender: Some(sender.into()),
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }
}

/// Outcome of one tool execution
///
/// Serialized externally tagged: `{"success": ..}` or `{"failure": {"error": ..}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutput {
    Success(Value),
    Failure { error: String },
}

impl ToolOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// JSON shape stored in the data map; failures become `{"error": "..."}`
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Success(value) => value.clone(),
            Self::Failure { error } => json!({ "error": error }),
        }
    }
}

/// A tool name paired with its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub output: ToolOutput,
}

impl ToolResult {
    pub fn success(tool_name: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: ToolOutput::Success(payload),
        }
    }

    pub fn failure(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: ToolOutput::failure(error),
        }
    }
}

/// The accumulator for a single orchestration run
#[derive(Debug, Clone, Serialize)]
pub struct State {
    run_id: Uuid,
    messages: Vec<Message>,
    data: DataMap,
    next_target: Option<Route>,
    visit_count: usize,
}

impl State {
    /// Seed a run with the user's query as the first message
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            messages: vec![Message::user(query)],
            data: DataMap::new(),
            next_target: None,
            visit_count: 0,
        }
    }

    // =========== Accessors ===========

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The original user query
    pub fn query(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map_or("", |m| m.content.as_str())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last `n` messages, oldest first
    pub fn recent_messages(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn data(&self) -> &DataMap {
        &self.data
    }

    /// Payload stored for `tool` under `category`
    pub fn get(&self, category: &str, tool: &str) -> Option<&Value> {
        self.data.get(category).and_then(|tools| tools.get(tool))
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.data.get(category).is_some_and(|tools| !tools.is_empty())
    }

    /// Every `(category, tool)` key currently present
    pub fn data_keys(&self) -> Vec<(String, String)> {
        self.data
            .iter()
            .flat_map(|(category, tools)| {
                tools
                    .keys()
                    .map(move |tool| (category.clone(), tool.clone()))
            })
            .collect()
    }

    pub fn next_target(&self) -> Option<Route> {
        self.next_target
    }

    pub fn visit_count(&self) -> usize {
        self.visit_count
    }

    // =========== Mutations ===========

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Shallow-union `results` into `data[category]`
    ///
    /// Results are applied in order, so a tool name repeated in `results`
    /// (or already present) ends up holding the last payload.
    pub fn merge(&mut self, category: &str, results: impl IntoIterator<Item = ToolResult>) {
        let bucket = self.data.entry(category.to_string()).or_default();
        for result in results {
            bucket.insert(result.tool_name, result.output.to_payload());
        }
    }

    pub fn set_next_target(&mut self, route: Route) {
        self.next_target = Some(route);
    }

    /// Count one completed worker visit
    pub fn record_visit(&mut self) {
        self.visit_count += 1;
    }
}
