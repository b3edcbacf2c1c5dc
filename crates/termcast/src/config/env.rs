//! Environment-based configuration.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CastError, Result};

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "TERMCAST";

/// Environment variable reader.
///
/// Values set with [`EnvConfig::with_var`] shadow the process environment,
/// which keeps tests away from global state.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Local overrides.
    overrides: HashMap<String, String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
        }
    }

    /// Shadow one variable (name without prefix).
    #[must_use]
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        let var_name = self.var_name(name);
        self.overrides.insert(var_name, value.into());
        self
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        self.overrides
            .get(&var_name)
            .cloned()
            .or_else(|| std::env::var(&var_name).ok())
    }

    /// Get a parsed value; a value that does not parse is an error.
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| {
                raw.trim().parse().map_err(|e| {
                    CastError::config(format!("{}={raw:?}: {e}", self.var_name(name)))
                })
            })
            .transpose()
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Get a non-negative number of seconds, possibly fractional.
    pub fn seconds(&self, name: &str) -> Result<Option<Duration>> {
        let Some(secs) = self.parse::<f64>(name)? else {
            return Ok(None);
        };
        Duration::try_from_secs_f64(secs).map(Some).map_err(|_| {
            CastError::config(format!(
                "{}={secs}: expected a non-negative number of seconds",
                self.var_name(name)
            ))
        })
    }
}

/// Variable names understood by termcast (without prefix).
pub mod vars {
    /// Record: idle clamp in seconds.
    pub const MAX_WAIT: &str = "MAX_WAIT";
    /// Record: command to run.
    pub const COMMAND: &str = "COMMAND";
    /// Record: document title.
    pub const TITLE: &str = "TITLE";
    /// Record: suppress notices.
    pub const QUIET: &str = "QUIET";
    /// Play: idle clamp in seconds.
    pub const PLAY_MAX_WAIT: &str = "PLAY_MAX_WAIT";
    /// Play: speed multiplier.
    pub const PLAY_SPEED: &str = "PLAY_SPEED";
    /// Log filter directive.
    pub const LOG: &str = "LOG";
}

/// Get a standard environment variable.
#[must_use]
pub fn get_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get the current shell.
#[must_use]
pub fn current_shell() -> Option<String> {
    get_env("SHELL")
}

/// Get the terminal type.
#[must_use]
pub fn term_type() -> Option<String> {
    get_env("TERM")
}
