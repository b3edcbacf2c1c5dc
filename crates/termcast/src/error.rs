//! Error types for termcast.
//!
//! [`CastError`] is the single error type of the engine. Its variants follow
//! the failure classes callers care about: the terminal device refused a
//! mode change, the child could not be started, I/O failed mid-session, a
//! document was malformed, or a remote document could not be fetched.

use termcast_pty::PtyError;
use thiserror::Error;

/// The main error type for termcast operations.
#[derive(Debug, Error)]
pub enum CastError {
    /// Terminal mode query or change failed.
    #[error("terminal device error: {0}")]
    Device(#[source] PtyError),

    /// The child process could not be started.
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] PtyError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    IoWithContext {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A document was malformed or could not be located.
    #[error("format error: {message}")]
    Format {
        /// Description of the problem.
        message: String,
    },

    /// A remote document could not be fetched.
    #[error("network error: {message}")]
    Network {
        /// Description of the problem.
        message: String,
        /// The transport error, when there is one.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// An invalid configuration value.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Result type for termcast operations.
pub type Result<T> = std::result::Result<T, CastError>;

impl CastError {
    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a network error without an underlying transport error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoWithContext {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O result with context.
    pub fn with_io_context<T>(result: std::io::Result<T>, context: impl Into<String>) -> Result<T> {
        result.map_err(|e| Self::io_context(context, e))
    }

    /// Check if this is a format error.
    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Check if this is a network error.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if this error aborts a recording before it starts.
    #[must_use]
    pub const fn is_fatal_setup(&self) -> bool {
        matches!(self, Self::Device(_) | Self::Spawn(_))
    }
}

impl From<PtyError> for CastError {
    fn from(err: PtyError) -> Self {
        match err {
            PtyError::GetAttributes(_) | PtyError::SetAttributes(_) => Self::Device(err),
            PtyError::Create(_) | PtyError::Spawn(_) => Self::Spawn(err),
            PtyError::Io(e) => Self::Io(e),
            other => Self::Io(std::io::Error::other(other)),
        }
    }
}

impl From<serde_json::Error> for CastError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return Self::Io(err.into());
        }
        Self::format(err.to_string())
    }
}

impl From<reqwest::Error> for CastError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn device_and_spawn_mapping() {
        let get = PtyError::GetAttributes(io::Error::other("nope"));
        assert!(matches!(CastError::from(get), CastError::Device(_)));

        let spawn = PtyError::Spawn(io::Error::new(io::ErrorKind::NotFound, "missing"));
        let err = CastError::from(spawn);
        assert!(matches!(err, CastError::Spawn(_)));
        assert!(err.is_fatal_setup());

        let closed = CastError::from(PtyError::Closed);
        assert!(matches!(closed, CastError::Io(_)));
    }

    #[test]
    fn json_syntax_is_format_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(CastError::from(err).is_format());
    }

    #[test]
    fn io_context_display() {
        let err = CastError::io_context(
            "writing document",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "writing document: denied");
    }

    #[test]
    fn network_display() {
        let err = CastError::network("HTTP 404 Not Found from http://x/y");
        assert!(err.is_network());
        assert!(err.to_string().contains("404"));
    }
}
