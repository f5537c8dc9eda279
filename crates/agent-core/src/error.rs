//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that terminate an orchestration run
///
/// Tool failures never appear here; they are folded into the run's data as
/// error payloads. Reaching the visit bound is a policy outcome, not an error.
#[derive(Error, Debug)]
pub enum Error {
    /// The Supervisor's classifier failed or produced an out-of-enum target
    #[error("Routing classification failed: {0}")]
    RoutingClassification(String),

    /// A worker's reasoning step failed; recorded as commentary by the worker
    #[error("Reasoning failed: {0}")]
    Reasoning(String),

    /// The final synthesis step failed
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// The run was cancelled between node transitions
    #[error("Run cancelled")]
    Cancelled,

    /// The orchestrator could not be assembled
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Whether this error came from a caller-initiated cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
