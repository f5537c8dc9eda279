//! Tool trait definition

use crate::{Result, ToolError};
use agent_llm::ToolDefinition;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A named unit of work a worker can request
///
/// Caching, retries and rate limiting are the implementation's business;
/// callers only see a JSON payload or a [`ToolError`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute with arguments matching [`Tool::input_schema`]
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Unique within a registry, and the name the model calls the tool by
    fn name(&self) -> &str;

    /// Tells the model when the tool is useful
    fn description(&self) -> &str;

    /// JSON schema for the arguments
    fn input_schema(&self) -> Value;

    /// Definition offered to the model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Deserialize tool arguments into a typed record
pub fn parse_args<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tokio_test::assert_ok;

    #[derive(Debug, Deserialize)]
    struct SymbolArgs {
        symbol: String,
    }

    #[test]
    fn test_parse_args() {
        let args: SymbolArgs = assert_ok!(parse_args(json!({"symbol": "AAPL"})));
        assert_eq!(args.symbol, "AAPL");

        let err = parse_args::<SymbolArgs>(json!({"ticker": "AAPL"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().starts_with("Invalid parameters"));
    }
}
