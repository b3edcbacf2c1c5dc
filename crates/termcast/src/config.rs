//! Configuration types for termcast.
//!
//! [`RecordConfig`] and [`PlayConfig`] carry the knobs of the two top-level
//! operations; [`LoggingConfig`] feeds [`crate::logging::init`]. Each can be
//! layered over prefixed environment variables through [`EnvConfig`].

pub mod env;

use std::path::PathBuf;
use std::time::Duration;

pub use env::EnvConfig;
use env::vars;
use termcast_pty::WindowSize;

use crate::asciicast::Env;
use crate::error::{CastError, Result};

/// Shell used when neither the config nor `$SHELL` names a command.
#[cfg(unix)]
pub const FALLBACK_SHELL: &str = "/bin/sh";

/// Shell used when neither the config nor `$SHELL` names a command.
#[cfg(windows)]
pub const FALLBACK_SHELL: &str = "cmd.exe";

/// Terminal size above which a recording prints a warning.
pub const OPTIMAL_SIZE: WindowSize = WindowSize::new(120, 30);

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Configuration for one recording.
#[derive(Debug, Clone, Default)]
pub struct RecordConfig {
    /// Command to run; `None` means the user's shell.
    pub command: Option<String>,

    /// Document title.
    pub title: String,

    /// Longest idle period kept in the recording. Zero disables the clamp.
    pub max_wait: Duration,

    /// Suppress start/finish notices.
    pub quiet: bool,

    /// `TERM`/`SHELL` stored in the document; `None` captures the process
    /// environment at record time.
    pub env: Option<Env>,

    /// Document width/height; `None` uses the invoking terminal's size.
    pub size: Option<WindowSize>,
}

impl RecordConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TERMCAST_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::new().apply_env(&EnvConfig::default())
    }

    /// Override fields from `env`.
    pub fn apply_env(mut self, env: &EnvConfig) -> Result<Self> {
        if let Some(command) = env.get(vars::COMMAND) {
            self.command = Some(command);
        }
        if let Some(title) = env.get(vars::TITLE) {
            self.title = title;
        }
        if let Some(max_wait) = env.seconds(vars::MAX_WAIT)? {
            self.max_wait = max_wait;
        }
        if let Some(quiet) = env.bool(vars::QUIET) {
            self.quiet = quiet;
        }
        Ok(self)
    }

    /// Set the command.
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the idle clamp.
    #[must_use]
    pub const fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Set quiet mode.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Set the stored environment.
    #[must_use]
    pub fn env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    /// Set the document size.
    #[must_use]
    pub const fn size(mut self, size: WindowSize) -> Self {
        self.size = Some(size);
        self
    }

    /// The command that will actually run.
    #[must_use]
    pub fn effective_command(&self) -> String {
        self.command
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or_else(env::current_shell)
            .unwrap_or_else(|| FALLBACK_SHELL.to_string())
    }
}

/// Configuration for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayConfig {
    /// Longest pause between frames. Zero disables the clamp.
    pub max_wait: Duration,

    /// Speed multiplier, applied after the clamp. Must be positive.
    pub speed: f64,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::ZERO,
            speed: 1.0,
        }
    }
}

impl PlayConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TERMCAST_PLAY_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::new().apply_env(&EnvConfig::default())
    }

    /// Override fields from `env`.
    pub fn apply_env(mut self, env: &EnvConfig) -> Result<Self> {
        if let Some(max_wait) = env.seconds(vars::PLAY_MAX_WAIT)? {
            self.max_wait = max_wait;
        }
        if let Some(speed) = env.parse::<f64>(vars::PLAY_SPEED)? {
            self.speed = speed;
        }
        self.validate()?;
        Ok(self)
    }

    /// Set the idle clamp.
    #[must_use]
    pub const fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Set the speed multiplier.
    #[must_use]
    pub const fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Check invariants.
    pub fn validate(&self) -> Result<()> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(CastError::config(format!(
                "playback speed must be a positive number, got {}",
                self.speed
            )));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,

    /// Output format.
    pub format: LogFormat,

    /// Log file; `None` logs to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the filter taken from `TERMCAST_LOG`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new().apply_env(&EnvConfig::default())
    }

    /// Override fields from `env`.
    #[must_use]
    pub fn apply_env(mut self, env: &EnvConfig) -> Self {
        if let Some(filter) = env.get(vars::LOG) {
            self.filter = filter;
        }
        self
    }

    /// Set the filter directive.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Set the log format.
    #[must_use]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log file path.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_defaults() {
        let config = RecordConfig::new();
        assert_eq!(config.max_wait, Duration::ZERO);
        assert!(!config.quiet);
        assert!(config.title.is_empty());
    }

    #[test]
    fn record_env_overrides() {
        let env = EnvConfig::new("T")
            .with_var(vars::COMMAND, "bash -l")
            .with_var(vars::TITLE, "demo")
            .with_var(vars::MAX_WAIT, "2.5")
            .with_var(vars::QUIET, "yes");

        let config = RecordConfig::new().apply_env(&env).unwrap();
        assert_eq!(config.command.as_deref(), Some("bash -l"));
        assert_eq!(config.title, "demo");
        assert_eq!(config.max_wait, Duration::from_millis(2500));
        assert!(config.quiet);
    }

    #[test]
    fn record_env_rejects_bad_max_wait() {
        let env = EnvConfig::new("T").with_var(vars::MAX_WAIT, "soon");
        assert!(matches!(
            RecordConfig::new().apply_env(&env),
            Err(CastError::Config { .. })
        ));
    }

    #[test]
    fn explicit_command_wins() {
        let config = RecordConfig::new().command("htop");
        assert_eq!(config.effective_command(), "htop");

        let blank = RecordConfig::new().command("  ");
        assert!(!blank.effective_command().trim().is_empty());
    }

    #[test]
    fn play_speed_must_be_positive() {
        assert!(PlayConfig::new().validate().is_ok());
        assert!(PlayConfig::new().speed(0.0).validate().is_err());
        assert!(PlayConfig::new().speed(-1.0).validate().is_err());
        assert!(PlayConfig::new().speed(f64::NAN).validate().is_err());

        let env = EnvConfig::new("T").with_var(vars::PLAY_SPEED, "0");
        assert!(PlayConfig::new().apply_env(&env).is_err());
    }

    #[test]
    fn play_env_overrides() {
        let env = EnvConfig::new("T")
            .with_var(vars::PLAY_SPEED, "2")
            .with_var(vars::PLAY_MAX_WAIT, "1");
        let config = PlayConfig::new().apply_env(&env).unwrap();
        assert!((config.speed - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.max_wait, Duration::from_secs(1));
    }

    #[test]
    fn logging_builder() {
        let config = LoggingConfig::new()
            .filter("termcast=debug")
            .format(LogFormat::Json)
            .file("/tmp/termcast.log");
        assert_eq!(config.filter, "termcast=debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.file.is_some());

        let env = EnvConfig::new("T").with_var(vars::LOG, "trace");
        assert_eq!(LoggingConfig::new().apply_env(&env).filter, "trace");
    }
}
