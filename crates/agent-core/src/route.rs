//! Routing targets and the Supervisor's decision type
//!
//! The set of targets is closed: three worker routes plus `Finish`. A
//! classifier's raw output only becomes a [`RoutingDecision`] by passing
//! through [`RoutingDecision::decode`], which rejects anything outside the
//! enum instead of falling back to a default target.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A routing target chosen by the Supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Price, quote and indicator work
    Technical,
    /// News and social sentiment work
    Sentiment,
    /// Open web research
    Research,
    /// Stop routing and synthesize the answer
    Finish,
}

impl Route {
    /// Every route that is served by a worker, in canonical order
    pub const WORKERS: [Route; 3] = [Route::Technical, Route::Sentiment, Route::Research];

    /// Canonical lowercase name, as used in classifier schemas and data categories
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Sentiment => "sentiment",
            Self::Research => "research",
            Self::Finish => "finish",
        }
    }

    /// Whether a worker serves this route
    pub fn is_worker(&self) -> bool {
        !matches!(self, Self::Finish)
    }

    /// Data category a worker on this route writes into
    pub fn category(&self) -> Option<&'static str> {
        self.is_worker().then(|| self.as_str())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = RouteDecodeError;

    /// Matches the canonical names, ignoring ASCII case and surrounding whitespace
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim();
        [Self::Technical, Self::Sentiment, Self::Research, Self::Finish]
            .into_iter()
            .find(|route| route.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| RouteDecodeError::UnknownTarget(name.to_string()))
    }
}

/// Reasons a classifier output could not be decoded into a [`RoutingDecision`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteDecodeError {
    /// The text was not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The payload was JSON but not an object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A required field is missing or is not a string
    #[error("missing or non-string field '{0}'")]
    MissingField(&'static str),

    /// The target is outside the closed route set
    #[error("unknown routing target '{0}'")]
    UnknownTarget(String),
}

/// The Supervisor's decision for one visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Target to transition to
    pub next: Route,
    /// Classifier's short justification
    pub reasoning: String,
}

impl RoutingDecision {
    /// Create a decision
    pub fn new(next: Route, reasoning: impl Into<String>) -> Self {
        Self {
            next,
            reasoning: reasoning.into(),
        }
    }

    /// Create a `Finish` decision
    pub fn finish(reasoning: impl Into<String>) -> Self {
        Self::new(Route::Finish, reasoning)
    }

    /// Strictly decode a structured classifier payload
    ///
    /// The payload must be an object with a string `next` naming a known
    /// route and a string `reasoning`. Extra fields are ignored.
    pub fn decode(value: &Value) -> std::result::Result<Self, RouteDecodeError> {
        let object = value
            .as_object()
            .ok_or_else(|| RouteDecodeError::NotAnObject(json_type_name(value)))?;

        let next = object
            .get("next")
            .and_then(Value::as_str)
            .ok_or(RouteDecodeError::MissingField("next"))?
            .parse::<Route>()?;

        let reasoning = object
            .get("reasoning")
            .and_then(Value::as_str)
            .ok_or(RouteDecodeError::MissingField("reasoning"))?;

        Ok(Self::new(next, reasoning.trim()))
    }

    /// Decode a decision emitted as JSON text
    ///
    /// A surrounding markdown code fence is tolerated; nothing else is.
    pub fn decode_str(text: &str) -> std::result::Result<Self, RouteDecodeError> {
        let body = strip_code_fence(text.trim());
        let value: Value = serde_json::from_str(body)
            .map_err(|e| RouteDecodeError::InvalidJson(e.to_string()))?;
        Self::decode(&value)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
