//! Core data model for the market query orchestrator
//!
//! This crate defines the per-run accumulator ([`State`]), the closed set of
//! routing targets ([`Route`]), the Supervisor's [`RoutingDecision`] with its
//! strict decoder, and the run-level [`Error`] taxonomy shared by every
//! other crate in the workspace.

pub mod error;
pub mod route;
pub mod state;

pub use error::{Error, Result};
pub use route::{Route, RouteDecodeError, RoutingDecision};
pub use state::{DataMap, Message, Role, State, ToolCall, ToolOutput, ToolResult};
