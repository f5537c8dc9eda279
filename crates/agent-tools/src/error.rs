//! Failures raised inside a tool

use thiserror::Error;

/// Result type for tool execution
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors a tool can raise
///
/// None of these cross the bridge; each is rendered into an
/// `{"error": "..."}` payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidArguments(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Upstream answered with something we could not interpret
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Provider not configured or no data for the request
    #[error("Data unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}
