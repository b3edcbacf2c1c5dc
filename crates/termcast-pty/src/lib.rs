//! termcast-pty: OS primitives for recording terminal sessions
//!
//! This crate holds everything that talks to the operating system on behalf
//! of the `termcast` recording engine.
//!
//! # Platform Support
//!
//! - **Unix**: pseudo-terminal allocation and child spawning via `rustix`,
//!   raw-mode management, `SIGWINCH`/interrupt watching via `signal-hook`,
//!   and a cancellable copy loop built on `poll(2)` and a private pipe.
//! - **Windows**: a console screen-buffer reader that produces
//!   [`ScreenSnapshot`]s for the polling capture backend.
//!
//! # Quick Start
//!
//! ```ignore
//! use termcast_pty::{PtyConfig, UnixPtySystem};
//! use tokio::io::AsyncReadExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PtyConfig::builder().env("ASCIINEMA_REC", "1").build();
//!     let (mut master, mut child) = UnixPtySystem::spawn("sh", ["-c", "echo hi"], &config).await?;
//!
//!     let mut buf = [0u8; 1024];
//!     let n = master.read(&mut buf).await?;
//!     println!("{}", String::from_utf8_lossy(&buf[..n]));
//!
//!     child.wait().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod screen;
pub mod status;

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod windows;

// Re-export primary types
pub use config::{PtyConfig, PtyConfigBuilder, WindowSize};
pub use error::{PtyError, Result};
pub use screen::{Cell, CellAttributes, ScreenRow, ScreenSnapshot, ScreenSource};
pub use status::ExitStatus;

// Platform-specific re-exports
#[cfg(unix)]
pub use unix::{
    CancelToken, Canceller, FdWriter, ModeRestorer, RawModeGuard, ResizeWatcher, SignalWatcher,
    UnixPtyChild, UnixPtyMaster, UnixPtySystem, cancel_pair, copy_until_cancelled, is_terminal,
    make_raw, size_or_default, terminal_size,
};

#[cfg(windows)]
pub use windows::{WindowsConsole, console_size};

/// Size reported when the invoking terminal is not a device (24 rows, 80 columns).
pub const FALLBACK_SIZE: WindowSize = WindowSize::new(80, 24);

/// Size of the buffers used by the copy loops.
pub const COPY_BUFFER_SIZE: usize = 32 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_24_by_80() {
        assert_eq!(FALLBACK_SIZE.rows, 24);
        assert_eq!(FALLBACK_SIZE.cols, 80);
    }

    #[test]
    fn default_config() {
        let config = PtyConfig::default();
        assert_eq!(config.window_size, FALLBACK_SIZE);
        assert!(config.env.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawn_echo() {
        let config = PtyConfig::default();
        let result = UnixPtySystem::spawn("echo", ["test"], &config).await;

        // May fail in some CI environments
        if let Ok((_master, mut child)) = result {
            let status = child.wait().await;
            assert!(status.is_ok());
        }
    }
}
