//! Tool framework for the market query orchestrator
//!
//! - [`Tool`]: a named, schema-typed unit of external I/O
//! - [`ToolRegistry`]: the fixed capability set a worker is built with
//! - [`ToolBridge`]: executes requested calls and normalises every outcome,
//!   failures included, into a [`agent_core::ToolResult`]

pub mod bridge;
pub mod error;
pub mod registry;
pub mod tool;

pub use bridge::{ToolBridge, ToolExecution};
pub use error::{Result, ToolError};
pub use registry::ToolRegistry;
pub use tool::{Tool, parse_args};
