//! The orchestration driver
//!
//! An explicit loop over the state machine:
//!
//! ```text
//! Start -> Supervisor -> Worker(X) -> Supervisor -> ... -> FinalSynthesis -> End
//! ```
//!
//! Exactly one node is active at a time. Every worker visit returns to the
//! Supervisor, and the Supervisor forces `Finish` once the visit budget is
//! spent, so a run performs at most `max_visits` worker visits.

use crate::cancel::guarded;
use crate::config::OrchestratorConfig;
use crate::events::{NoOpEventHandler, OrchestratorEventHandler};
use crate::policy::TerminationPolicy;
use crate::supervisor::{RouteClassifier, Supervisor};
use crate::synthesis::Synthesizer;
use crate::worker::Worker;
use agent_core::{Error, Result, Route, State};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

/// A node of the state machine, as recorded in [`RunReport::transitions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Supervisor,
    Worker(Route),
    FinalSynthesis,
    End,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub answer: String,
    /// Final state, as handed to synthesis
    pub state: State,
    /// Nodes visited, in order
    pub transitions: Vec<Phase>,
    /// The visit bound, not the classifier, ended routing
    pub forced_finish: bool,
}

/// Generic supervisor/worker engine
pub struct Orchestrator {
    supervisor: Supervisor,
    workers: BTreeMap<Route, Worker>,
    synthesizer: Arc<dyn Synthesizer>,
    events: Arc<dyn OrchestratorEventHandler>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Worker routes this orchestrator can dispatch to
    pub fn routes(&self) -> Vec<Route> {
        self.workers.keys().copied().collect()
    }

    /// Answer `query`
    pub async fn run(&self, query: &str) -> Result<String> {
        self.run_with_cancellation(query, CancellationToken::new())
            .await
    }

    /// Answer `query`, aborting with [`Error::Cancelled`] when `cancel` fires
    pub async fn run_with_cancellation(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<String> {
        let report = self.execute(query, &cancel).await?;
        Ok(report.answer)
    }

    /// Answer `query` and return the full run record
    pub async fn run_report(&self, query: &str) -> Result<RunReport> {
        self.execute(query, &CancellationToken::new()).await
    }

    /// [`Orchestrator::run_report`] with a cancellation token
    pub async fn run_report_with_cancellation(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        self.execute(query, &cancel).await
    }

    async fn execute(&self, query: &str, cancel: &CancellationToken) -> Result<RunReport> {
        let state = State::new(query);
        let run_id = state.run_id();
        let span = info_span!("run", %run_id);

        let result = self.drive(state, cancel).instrument(span).await;

        match &result {
            Ok(report) => self.events.on_complete(run_id, &report.answer).await,
            Err(e) => {
                warn!(%run_id, error = %e, "Run failed");
                self.events.on_error(run_id, e).await;
            }
        }
        result
    }

    async fn drive(&self, mut state: State, cancel: &CancellationToken) -> Result<RunReport> {
        let run_id = state.run_id();
        let available = self.routes();
        let mut transitions = vec![Phase::Start];

        info!(query = %state.query(), max_visits = self.config.max_visits, "Run started");

        let forced_finish = loop {
            transitions.push(Phase::Supervisor);
            let outcome = self.supervisor.route(&mut state, &available, cancel).await?;
            self.events
                .on_route(run_id, &outcome.decision, outcome.forced)
                .await;

            let route = outcome.decision.next;
            if route == Route::Finish {
                break outcome.forced;
            }

            let worker = self.workers.get(&route).ok_or_else(|| {
                Error::RoutingClassification(format!("no worker registered for route '{route}'"))
            })?;

            transitions.push(Phase::Worker(route));
            let visit = worker.visit(&mut state, cancel).await?;

            for result in &visit.results {
                self.events.on_tool_result(run_id, route, result).await;
            }
            self.events
                .on_worker_done(run_id, route, state.visit_count())
                .await;
        };

        transitions.push(Phase::FinalSynthesis);
        info!(
            visit_count = state.visit_count(),
            forced_finish,
            categories = state.data().len(),
            "Entering final synthesis"
        );

        let answer = guarded(cancel, self.synthesizer.synthesize(&state)).await??;
        let answer = answer.trim().to_string();
        if answer.is_empty() {
            return Err(Error::Synthesis("empty answer".to_string()));
        }

        transitions.push(Phase::End);
        info!(visit_count = state.visit_count(), "Run complete");

        Ok(RunReport {
            answer,
            state,
            transitions,
            forced_finish,
        })
    }
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    classifier: Option<Arc<dyn RouteClassifier>>,
    workers: Vec<Worker>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    events: Option<Arc<dyn OrchestratorEventHandler>>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: OrchestratorConfig::default(),
            classifier: None,
            workers: Vec::new(),
            synthesizer: None,
            events: None,
        }
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn RouteClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn worker(mut self, worker: Worker) -> Self {
        self.workers.push(worker);
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn OrchestratorEventHandler>) -> Self {
        self.events = Some(handler);
        self
    }

    /// Validate the wiring and build
    ///
    /// Fails unless there is a classifier, a synthesizer and at least one
    /// worker, each worker serves a distinct non-`Finish` route, and no tool
    /// appears in two capability sets.
    pub fn build(self) -> Result<Orchestrator> {
        self.config.validate()?;

        let classifier = self
            .classifier
            .ok_or_else(|| Error::InitializationFailed("classifier is required".to_string()))?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| Error::InitializationFailed("synthesizer is required".to_string()))?;

        if self.workers.is_empty() {
            return Err(Error::InitializationFailed(
                "at least one worker is required".to_string(),
            ));
        }

        let mut workers = BTreeMap::new();
        let mut claimed: BTreeSet<String> = BTreeSet::new();
        for worker in self.workers {
            let route = worker.route();
            if !route.is_worker() {
                return Err(Error::InitializationFailed(
                    "a worker cannot serve the finish route".to_string(),
                ));
            }
            for tool in worker.tools().names() {
                if !claimed.insert(tool.to_string()) {
                    return Err(Error::InitializationFailed(format!(
                        "tool '{tool}' is bound to more than one worker"
                    )));
                }
            }
            let worker = worker.with_execution(self.config.tool_execution);
            if workers.insert(route, worker).is_some() {
                return Err(Error::InitializationFailed(format!(
                    "more than one worker for route '{route}'"
                )));
            }
        }

        let supervisor = Supervisor::new(
            classifier,
            TerminationPolicy::new(self.config.max_visits),
            self.config.recent_messages,
        );

        Ok(Orchestrator {
            supervisor,
            workers,
            synthesizer,
            events: self.events.unwrap_or_else(|| Arc::new(NoOpEventHandler)),
            config: self.config,
        })
    }
}
