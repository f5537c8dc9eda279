//! Prompt templates rendered with MiniJinja

use agent_core::{DataMap, Error, Message, Result};
use minijinja::Environment;
use serde::Serialize;

/// A Jinja prompt source, syntax-checked on construction
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    source: String,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        Environment::new()
            .template_from_str(&source)
            .map_err(|e| Error::InitializationFailed(format!("prompt '{name}': {e}")))?;

        Ok(Self { name, source })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render<S: Serialize>(&self, ctx: S) -> std::result::Result<String, minijinja::Error> {
        Environment::new().render_str(&self.source, ctx)
    }
}

/// Pretty JSON for embedding the data map in a prompt
pub(crate) fn data_json(data: &DataMap) -> String {
    if data.is_empty() {
        return "{}".to_string();
    }
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// One `[sender] content` line per message; senderless messages are the user's
pub(crate) fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| {
            let who = message.sender.as_deref().unwrap_or("user");
            format!("[{who}] {}\n", message.content)
        })
        .collect()
}
