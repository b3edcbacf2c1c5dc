//! Diagnostic logging setup.
//!
//! The engine only emits `tracing` events; [`init`] installs a subscriber for
//! binaries that want them shown. `RUST_LOG` takes precedence over the
//! configured filter.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{CastError, Result};

/// Install the global subscriber described by `config`.
///
/// Calling this when a subscriber is already installed does nothing.
///
/// # Errors
///
/// `Config` for an invalid filter directive, `IoWithContext` if the log file
/// cannot be opened.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match (&config.file, config.format) {
        (None, LogFormat::Pretty) => builder.with_writer(io::stderr).try_init(),
        (None, LogFormat::Json) => builder.json().with_writer(io::stderr).try_init(),
        (Some(path), format) => {
            let file = CastError::with_io_context(
                OpenOptions::new().create(true).append(true).open(path),
                format!("opening log file {}", path.display()),
            )?;
            let writer = Mutex::new(file);
            match format {
                LogFormat::Pretty => builder.with_ansi(false).with_writer(writer).try_init(),
                LogFormat::Json => builder.json().with_writer(writer).try_init(),
            }
        }
    };

    if let Err(e) = installed {
        tracing::debug!(error = %e, "subscriber already installed");
    }
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| CastError::config(format!("invalid log filter {:?}: {e}", config.filter)))
}
