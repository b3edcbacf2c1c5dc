//! Error types for the termcast-pty crate.
//!
//! [`PtyError`] covers every failure mode of the OS layer: allocating a
//! pseudo-terminal, spawning the child, changing device modes and reading
//! the console screen buffer.

use std::io;

/// The error type for OS-level terminal operations.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    /// Failed to create a new PTY.
    #[error("failed to create PTY: {0}")]
    Create(#[source] io::Error),

    /// Failed to spawn a child process.
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] io::Error),

    /// An I/O error occurred during PTY operations.
    #[error("PTY I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to set terminal attributes.
    #[error("failed to set terminal attributes: {0}")]
    SetAttributes(#[source] io::Error),

    /// Failed to get terminal attributes.
    #[error("failed to get terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),

    /// Failed to resize the PTY.
    #[error("failed to resize PTY: {0}")]
    Resize(#[source] io::Error),

    /// The PTY has been closed.
    #[error("PTY has been closed")]
    Closed,

    /// Failed to install or deliver a signal.
    #[error("signal error: {0}")]
    Signal(#[source] io::Error),

    /// Failed to wait for the child process.
    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),

    /// A console API call failed.
    #[cfg(windows)]
    #[error("console error: {message} (code: {code})")]
    Console {
        /// Name of the failing call.
        message: String,
        /// The Windows error code.
        code: u32,
    },
}

/// A specialized Result type for PTY operations.
pub type Result<T> = std::result::Result<T, PtyError>;

/// Convert a rustix errno into a `std::io::Error`.
#[cfg(unix)]
pub(crate) fn os_error(errno: rustix::io::Errno) -> io::Error {
    io::Error::from_raw_os_error(errno.raw_os_error())
}

#[cfg(unix)]
impl From<rustix::io::Errno> for PtyError {
    fn from(errno: rustix::io::Errno) -> Self {
        Self::Io(os_error(errno))
    }
}
