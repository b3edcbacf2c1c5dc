//! Capture backends.
//!
//! A [`Capture`] runs a command for the user while copying everything it
//! displays into a sink. [`PtySession`] does this with a pseudo-terminal;
//! [`ConsoleCaptureSession`] reconstructs the output by polling a console
//! screen buffer on platforms without PTYs. [`NativeCapture`] names the
//! backend for the current platform.

pub mod console;
#[cfg(unix)]
pub mod pty;

use std::future::Future;
use std::io::Write;

pub use console::{ConsoleCaptureSession, POLL_INTERVAL, ScreenDiffer};
#[cfg(unix)]
pub use pty::{GRACE_PERIOD, PtySession};

use crate::error::Result;

/// Variable set to `1` in the recorded command's environment.
pub const REC_ENV_VAR: &str = "ASCIINEMA_REC";

/// Something that can run a command and capture what it displays.
pub trait Capture {
    /// Run `command` to completion, writing everything it displays to
    /// `sink` as it appears.
    ///
    /// # Errors
    ///
    /// Setup failures (terminal mode, spawning) and copy failures that happen
    /// before the command exits.
    fn record<W: Write + Send>(
        &mut self,
        command: &str,
        sink: &mut W,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The program and arguments that run `command` through the system shell.
#[cfg(unix)]
#[must_use]
pub fn shell_wrapper(command: &str) -> (&'static str, [&str; 2]) {
    ("/bin/sh", ["-c", command])
}

/// The program and arguments that run `command` through the system shell.
#[cfg(windows)]
#[must_use]
pub fn shell_wrapper(command: &str) -> (&'static str, [&str; 2]) {
    ("cmd", ["/C", command])
}

/// The capture backend for this platform.
#[cfg(unix)]
pub type NativeCapture = PtySession;

/// The capture backend for this platform.
#[cfg(windows)]
pub type NativeCapture = ConsoleCaptureSession<termcast_pty::WindowsConsole>;

/// Create the capture backend for this platform, attached to the process's
/// own terminal.
#[cfg(unix)]
pub fn native() -> Result<NativeCapture> {
    Ok(PtySession::new())
}

/// Create the capture backend for this platform, attached to the process's
/// own terminal.
#[cfg(windows)]
pub fn native() -> Result<NativeCapture> {
    Ok(ConsoleCaptureSession::new(termcast_pty::WindowsConsole::stdout()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn unix_shell_wrapper() {
        let (program, args) = shell_wrapper("echo hi");
        assert_eq!(program, "/bin/sh");
        assert_eq!(args, ["-c", "echo hi"]);
    }
}
