//! Configuration for orchestration runs

use agent_core::{Error, Result};
use agent_tools::ToolExecution;
use serde::{Deserialize, Serialize};

/// Worker visits allowed before `Finish` is forced
pub const DEFAULT_MAX_VISITS: usize = 3;

/// Default model for classification, reasoning and synthesis calls
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Settings shared by every node of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hard cap on worker visits per run
    pub max_visits: usize,

    /// How many trailing messages the classifier sees
    pub recent_messages: usize,

    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    pub temperature: Option<f32>,

    /// Scheduling of tool calls inside one worker visit
    pub tool_execution: ToolExecution,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_visits: DEFAULT_MAX_VISITS,
            recent_messages: 6,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2048,
            temperature: Some(0.2),
            tool_execution: ToolExecution::Concurrent,
        }
    }
}

impl OrchestratorConfig {
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }

    /// Defaults overridden by `MAX_VISITS` and `AGENT_MODEL`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let max_visits = agent_utils::env_parse_or("MAX_VISITS", defaults.max_visits)
            .map_err(|e| Error::Configuration(e.to_string()))?;

        Self::builder()
            .max_visits(max_visits)
            .model(agent_utils::env_or("AGENT_MODEL", &defaults.model))
            .build()
    }

    pub fn validate(&self) -> Result<()> {
        if self.recent_messages == 0 {
            return Err(Error::Configuration(
                "recent_messages must be greater than 0".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(Error::Configuration("model must not be empty".to_string()));
        }

        if self.max_tokens == 0 {
            return Err(Error::Configuration(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if let Some(t) = self.temperature.filter(|t| !(0.0..=1.0).contains(t)) {
            return Err(Error::Configuration(format!(
                "temperature must be within 0.0..=1.0, got {t}"
            )));
        }

        Ok(())
    }
}

/// Builder for [`OrchestratorConfig`]
#[derive(Debug, Default)]
pub struct OrchestratorConfigBuilder {
    max_visits: Option<usize>,
    recent_messages: Option<usize>,
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<Option<f32>>,
    tool_execution: Option<ToolExecution>,
}

impl OrchestratorConfigBuilder {
    /// Zero means the run goes straight to synthesis
    pub fn max_visits(mut self, max_visits: usize) -> Self {
        self.max_visits = Some(max_visits);
        self
    }

    pub fn recent_messages(mut self, n: usize) -> Self {
        self.recent_messages = Some(n);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// `None` leaves sampling to the provider default
    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn tool_execution(mut self, execution: ToolExecution) -> Self {
        self.tool_execution = Some(execution);
        self
    }

    pub fn build(self) -> Result<OrchestratorConfig> {
        let defaults = OrchestratorConfig::default();

        let config = OrchestratorConfig {
            max_visits: self.max_visits.unwrap_or(defaults.max_visits),
            recent_messages: self.recent_messages.unwrap_or(defaults.recent_messages),
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            tool_execution: self.tool_execution.unwrap_or(defaults.tool_execution),
        };

        config.validate()?;
        Ok(config)
    }
}
