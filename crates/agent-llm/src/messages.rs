//! Message types for LLM communication
//!
//! Shaped after the Anthropic Messages API: a message is a role plus a list
//! of content blocks, and tool use travels as blocks rather than as a
//! separate channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in a conversation
///
/// System prompts are carried on the request, not as messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },

    /// Tool use request from the assistant
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },

    /// Tool output sent back by the user side
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Create an assistant message from raw blocks
    pub fn assistant_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// All text blocks joined with newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `(name, input)` of every tool use block, in order
    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } => Some((name.as_str(), input)),
            _ => None,
        })
    }

    pub fn has_tool_uses(&self) -> bool {
        self.tool_uses().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");
        assert!(!msg.has_tool_uses());
    }

    #[test]
    fn test_text_joins_blocks_and_skips_tool_use() {
        let msg = Message::assistant_blocks(vec![
            ContentBlock::text("Checking the quote."),
            ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: "get_quote".to_string(),
                input: json!({"symbol": "AAPL"}),
            },
            ContentBlock::text("Done."),
        ]);

        assert_eq!(msg.text(), "Checking the quote.\nDone.");
        let uses: Vec<_> = msg.tool_uses().collect();
        assert_eq!(uses, vec![("get_quote", &json!({"symbol": "AAPL"}))]);
    }

    #[test]
    fn test_wire_shape() {
        let msg = Message::user("Test");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"role": "user", "content": [{"type": "text", "text": "Test"}]})
        );
    }
}
