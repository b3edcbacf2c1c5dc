//! Terminal device queries.

use std::os::unix::io::AsFd;

use rustix::termios::{isatty, tcgetwinsize};

use crate::FALLBACK_SIZE;
use crate::config::WindowSize;
use crate::error::{PtyError, Result, os_error};

/// Whether `fd` refers to a terminal device.
#[must_use]
pub fn is_terminal(fd: impl AsFd) -> bool {
    isatty(fd)
}

/// Query the window size of the terminal behind `fd`.
pub fn terminal_size(fd: impl AsFd) -> Result<WindowSize> {
    let winsize = tcgetwinsize(fd).map_err(|e| PtyError::GetAttributes(os_error(e)))?;
    Ok(WindowSize {
        cols: winsize.ws_col,
        rows: winsize.ws_row,
        xpixel: winsize.ws_xpixel,
        ypixel: winsize.ws_ypixel,
    })
}

/// The size of the terminal behind `fd`, or 24x80 when it is not a terminal.
#[must_use]
pub fn size_or_default(fd: impl AsFd) -> WindowSize {
    let fd = fd.as_fd();
    if !is_terminal(fd) {
        return FALLBACK_SIZE;
    }
    match terminal_size(fd) {
        Ok(size) if size.cols > 0 && size.rows > 0 => size,
        Ok(_) => FALLBACK_SIZE,
        Err(e) => {
            tracing::debug!(error = %e, "terminal size query failed, using fallback");
            FALLBACK_SIZE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_is_not_a_terminal() {
        let (read, write) = rustix::pipe::pipe().unwrap();
        assert!(!is_terminal(&read));
        assert_eq!(size_or_default(&write), FALLBACK_SIZE);
    }

    #[tokio::test]
    async fn pty_slave_reports_its_size() {
        let Ok((master, path)) = crate::unix::UnixPtyMaster::open() else {
            return;
        };
        let slave = crate::unix::open_slave(&path).unwrap();
        master.set_window_size(WindowSize::new(132, 43)).unwrap();

        assert!(is_terminal(&slave));
        assert_eq!(size_or_default(&slave), WindowSize::new(132, 43));
    }
}
