//! Final synthesis: the terminal step that writes the user-facing answer

use crate::config::OrchestratorConfig;
use crate::prompt::{PromptTemplate, data_json};
use crate::supervisor::SUPERVISOR_SENDER;
use agent_core::{Error, Result, Role, State};
use agent_llm::{CompletionRequest, LLMProvider, Message as LlmMessage};
use async_trait::async_trait;
use minijinja::context;
use std::sync::Arc;

/// Turns the accumulated state into one answer
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, state: &State) -> Result<String>;
}

/// Synthesizer backed by a language model
///
/// Routing commentary is left out of the prompt; the model only sees the
/// question, the collected data and what the workers wrote.
pub struct LlmSynthesizer {
    provider: Arc<dyn LLMProvider>,
    prompt: PromptTemplate,
    model: String,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl LlmSynthesizer {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        prompt: PromptTemplate,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            prompt,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl Synthesizer for LlmSynthesizer {
    async fn synthesize(&self, state: &State) -> Result<String> {
        let system = self
            .prompt
            .render(context! { query => state.query() })
            .map_err(|e| Error::Synthesis(format!("prompt render failed: {e}")))?;

        let mut user = format!("Question: {}\n\nCollected data:\n", state.query());
        user.push_str(&data_json(state.data()));

        let notes: Vec<String> = state
            .messages()
            .iter()
            .filter(|m| m.role == Role::Agent && m.sender.as_deref() != Some(SUPERVISOR_SENDER))
            .filter(|m| !m.content.trim().is_empty())
            .map(|m| format!("- {}", m.content.trim()))
            .collect();
        if !notes.is_empty() {
            user.push_str("\n\nAnalyst notes:\n");
            user.push_str(&notes.join("\n"));
        }

        let mut request = CompletionRequest::builder(&self.model)
            .system(system)
            .add_message(LlmMessage::user(user))
            .max_tokens(self.max_tokens);
        if let Some(t) = self.temperature {
            request = request.temperature(t);
        }

        let response = self
            .provider
            .complete(request.build())
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))?;

        let answer = response.text().trim().to_string();
        if answer.is_empty() {
            return Err(Error::Synthesis("model returned an empty answer".to_string()));
        }
        Ok(answer)
    }
}
