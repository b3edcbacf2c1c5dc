//! Unix platform implementation.
//!
//! This module provides the Unix-specific pieces of a recording session:
//!
//! - PTY master/slave pair allocation via openpt/grantpt/unlockpt
//! - Child process management with session and controlling terminal setup
//! - Raw-mode transformation and a restoring guard
//! - `SIGWINCH` and interrupt watching on dedicated threads
//! - A cancellable copy loop for the stdin direction
//!
//! # Example
//!
//! ```ignore
//! use termcast_pty::unix::UnixPtySystem;
//! use termcast_pty::PtyConfig;
//!
//! let config = PtyConfig::default();
//! let (master, child) = UnixPtySystem::spawn("/bin/sh", ["-c", "ls"], &config).await?;
//! ```

mod child;
mod copy;
mod pty;
mod raw;
mod resize;
mod signals;
mod tty;

use std::ffi::OsStr;

pub use child::{UnixPtyChild, spawn_child};
pub use copy::{CancelToken, Canceller, FdWriter, cancel_pair, copy_until_cancelled};
pub use pty::{UnixPtyMaster, open_slave};
pub use raw::{ModeRestorer, RawModeGuard, make_raw};
pub use resize::{ResizeWatcher, propagate_size};
pub use signals::{SignalWatcher, on_interrupt, on_window_change};
pub use tty::{is_terminal, size_or_default, terminal_size};

use crate::config::PtyConfig;
use crate::error::Result;

/// Unix PTY system.
///
/// Factory for pseudo-terminal sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixPtySystem;

impl UnixPtySystem {
    /// Allocate a pty sized per `config` and spawn `program` on its slave side.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn spawn<S, I>(
        program: S,
        args: I,
        config: &PtyConfig,
    ) -> Result<(UnixPtyMaster, UnixPtyChild)>
    where
        S: AsRef<OsStr>,
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        // Open master PTY
        let (master, slave_path) = UnixPtyMaster::open()?;

        // Set initial window size
        master.set_window_size(config.window_size)?;

        // Open slave for child; dropped when this returns so EOF reaches the master
        let slave_fd = open_slave(&slave_path)?;

        let child = spawn_child(slave_fd, program, args, config).await?;

        Ok((master, child))
    }
}
