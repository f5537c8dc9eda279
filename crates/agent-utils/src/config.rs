//! Environment-variable helpers for configuration layers

use std::str::FromStr;
use thiserror::Error;

/// A variable was set but could not be used
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid value '{value}' for {key}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Value of `key`, trimmed; unset and blank are both `None`
pub fn env_string(key: &str) -> Option<String> {
    non_blank(std::env::var(key).ok())
}

/// Value of `key` or `default`
pub fn env_or(key: &str, default: &str) -> String {
    env_string(key).unwrap_or_else(|| default.to_string())
}

/// Parse `key` if it is set
pub fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, env_string(key))
}

/// Parse `key`, using `default` when it is unset
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(env_parse(key)?.unwrap_or(default))
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_value<T>(key: &str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|e| ConfigError {
            key: key.to_string(),
            value: value.clone(),
            reason: e.to_string(),
        })
    })
    .transpose()
}
