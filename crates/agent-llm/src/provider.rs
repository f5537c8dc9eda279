//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A language model backend
///
/// One call is one suspension point for the caller; providers do not retry
/// or stream.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a single completion for `request`
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name used in logs (e.g. "anthropic")
    fn name(&self) -> &str;
}
