//! LLM provider abstraction for the market query orchestrator
//!
//! The orchestrator talks to a language model at three points: the
//! Supervisor's routing classification, each Worker's reasoning step and the
//! final synthesis. All three go through [`LLMProvider::complete`], so the
//! engine never depends on a concrete vendor.
//!
//! - Message and content-block types (text, tool use, tool result)
//! - Completion request/response types with an optional forced [`ToolChoice`]
//! - Tool definitions and JSON schema helpers
//! - The Anthropic Messages API provider (feature `anthropic`)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

pub use completion::{
    CompletionRequest, CompletionRequestBuilder, CompletionResponse, StopReason, TokenUsage,
    ToolChoice,
};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

#[cfg(feature = "anthropic")]
pub mod providers;
