//! Shared utilities for the market query orchestrator
//!
//! Tracing setup for binaries and typed environment-variable lookups used
//! by the configuration layers of the other crates.

pub mod config;
pub mod logging;

pub use config::{ConfigError, env_or, env_parse, env_parse_or, env_string};
pub use logging::{LogFormat, init_tracing};
