//! The invoking terminal: notices, size and interrupt clean-up.

use std::fmt::Display;
use std::io::{self, Write};

use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use termcast_pty::WindowSize;
#[cfg(unix)]
use termcast_pty::{ModeRestorer, SignalWatcher};
use tracing::debug;

use crate::error::Result;

/// How a notice is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Green: progress information.
    Info,
    /// Yellow: something the user may want to act on.
    Warning,
}

impl NoticeLevel {
    const fn color(self) -> Color {
        match self {
            Self::Info => Color::Green,
            Self::Warning => Color::Yellow,
        }
    }
}

/// Write a `~ message` line in the colour of `level`.
pub fn write_notice<W: Write>(out: &mut W, level: NoticeLevel, message: impl Display) -> io::Result<()> {
    execute!(
        out,
        SetForegroundColor(level.color()),
        Print(format!("~ {message}")),
        ResetColor,
        Print("\n")
    )
}

/// Print an informational notice to stderr unless `quiet`.
pub fn notice(message: impl Display, quiet: bool) {
    emit(NoticeLevel::Info, message, quiet);
}

/// Print a warning notice to stderr unless `quiet`.
pub fn warning(message: impl Display, quiet: bool) {
    emit(NoticeLevel::Warning, message, quiet);
}

fn emit(level: NoticeLevel, message: impl Display, quiet: bool) {
    if quiet {
        return;
    }
    if let Err(e) = write_notice(&mut io::stderr().lock(), level, message) {
        debug!(error = %e, "failed to print notice");
    }
}

/// Size of the invoking terminal, or 80x24 when it has none.
#[cfg(unix)]
#[must_use]
pub fn size() -> WindowSize {
    termcast_pty::size_or_default(io::stdout())
}

/// Size of the invoking terminal, or 80x24 when it has none.
#[cfg(windows)]
#[must_use]
pub fn size() -> WindowSize {
    termcast_pty::windows::console_size().unwrap_or(termcast_pty::FALLBACK_SIZE)
}

/// Show the cursor and reset colours on stdout.
pub fn reset() {
    if let Err(e) = execute!(io::stdout(), Show, ResetColor) {
        debug!(error = %e, "failed to reset terminal");
    }
}

/// Puts the terminal back in order if the process is interrupted.
///
/// While installed, `SIGINT` and `SIGTERM` restore the saved terminal mode
/// (if any), show the cursor, reset colours and exit with status 1. On
/// Windows the console is left to the system.
#[derive(Debug)]
pub struct InterruptGuard {
    #[cfg(unix)]
    watcher: SignalWatcher,
}

impl InterruptGuard {
    /// Install the handler; `restorer` puts raw mode back.
    #[cfg(unix)]
    pub fn install(restorer: Option<ModeRestorer>) -> Result<Self> {
        let watcher = termcast_pty::unix::on_interrupt(move |signal| {
            if let Some(restorer) = &restorer
                && let Err(e) = restorer.restore()
            {
                tracing::warn!(error = %e, "failed to restore terminal mode");
            }
            reset();
            debug!(signal, "interrupted");
            std::process::exit(1);
        })
        .map_err(|e| crate::error::CastError::io_context("installing interrupt handler", e))?;
        Ok(Self { watcher })
    }

    /// Install the handler.
    #[cfg(windows)]
    pub fn install(_restorer: Option<std::convert::Infallible>) -> Result<Self> {
        Ok(Self {})
    }

    /// Install a handler that only resets cursor and colours.
    pub fn for_playback() -> Result<Self> {
        Self::install(None)
    }

    /// Remove the handler.
    pub fn uninstall(self) {
        drop(self);
    }
}

#[cfg(unix)]
impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.watcher.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_format() {
        let mut out = Vec::new();
        write_notice(&mut out, NoticeLevel::Info, "Asciicast recording started.").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b["));
        assert!(text.contains("~ Asciicast recording started."));
        assert!(text.ends_with("\x1b[0m\n"));
    }

    #[test]
    fn warning_is_yellow() {
        let mut info = Vec::new();
        let mut warn = Vec::new();
        write_notice(&mut info, NoticeLevel::Info, "x").unwrap();
        write_notice(&mut warn, NoticeLevel::Warning, "x").unwrap();
        assert_ne!(info, warn);
    }

    #[test]
    fn size_is_never_zero() {
        let size = size();
        assert!(size.cols > 0 && size.rows > 0);
    }

    #[cfg(unix)]
    #[test]
    fn guard_installs_and_uninstalls() {
        let guard = InterruptGuard::for_playback().unwrap();
        guard.uninstall();
    }
}
