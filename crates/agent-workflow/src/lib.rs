//! Supervisor/worker orchestration engine
//!
//! One user query runs as a bounded walk of a small state machine: the
//! [`Supervisor`] picks a worker or finishes, each [`Worker`] runs one
//! reasoning step and folds any tool results into the shared
//! [`agent_core::State`], and the [`Synthesizer`] turns the final state into
//! the answer. The [`TerminationPolicy`] caps worker visits so every run
//! ends.
//!
//! ```no_run
//! use agent_workflow::{Orchestrator, OrchestratorConfig};
//! # use std::sync::Arc;
//! # async fn example(
//! #     classifier: Arc<dyn agent_workflow::RouteClassifier>,
//! #     technical: agent_workflow::Worker,
//! #     synthesizer: Arc<dyn agent_workflow::Synthesizer>,
//! # ) -> agent_core::Result<()> {
//! let orchestrator = Orchestrator::builder()
//!     .config(OrchestratorConfig::default())
//!     .classifier(classifier)
//!     .worker(technical)
//!     .synthesizer(synthesizer)
//!     .build()?;
//!
//! let answer = orchestrator.run("What is the price of BTC?").await?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod engine;
pub mod events;
pub mod policy;
pub mod prompt;
pub mod supervisor;
pub mod synthesis;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{DEFAULT_MAX_VISITS, OrchestratorConfig, OrchestratorConfigBuilder};
pub use engine::{Orchestrator, OrchestratorBuilder, Phase, RunReport};
pub use events::{NoOpEventHandler, OrchestratorEventHandler};
pub use policy::TerminationPolicy;
pub use prompt::PromptTemplate;
pub use supervisor::{
    LlmRouteClassifier, RouteClassifier, RoutingInput, SUPERVISOR_SENDER, Supervisor,
    SupervisorOutcome,
};
pub use synthesis::{LlmSynthesizer, Synthesizer};
pub use worker::{LlmReasoner, ReasoningInput, ReasoningStep, VisitOutcome, Worker, WorkerReasoner};
