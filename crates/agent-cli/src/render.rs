//! Tabular view of the data a run collected

use agent_core::State;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use serde_json::Value;

const MAX_CELL_CHARS: usize = 120;

/// One row per (category, tool) entry; error payloads show their message
pub fn data_table(state: &State) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Category", "Tool", "Result"]);

    for (category, tools) in state.data() {
        for (tool, payload) in tools {
            table.add_row(vec![category.clone(), tool.clone(), cell(payload)]);
        }
    }
    table
}

fn cell(payload: &Value) -> String {
    if let Some(error) = payload.get("error").and_then(Value::as_str) {
        return format!("error: {error}");
    }
    let text = payload.to_string();
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}
