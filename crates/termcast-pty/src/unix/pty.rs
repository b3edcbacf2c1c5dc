//! Unix PTY allocation and management.
//!
//! This module provides the PTY master used by the capture engine, built on
//! rustix for the low-level calls and Tokio's `AsyncFd` for readiness.

use std::io;
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::pin::Pin;
use std::task::{Context, Poll};

use rustix::fs::{OFlags, fcntl_setfl};
use rustix::io::{FdFlags, fcntl_getfd, fcntl_setfd};
use rustix::pty::{OpenptFlags, grantpt, openpt, ptsname, unlockpt};
use rustix::termios::{Winsize, tcgetwinsize, tcsetwinsize};
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, ReadBuf};

use crate::config::WindowSize;
use crate::error::{PtyError, Result, os_error};

/// Unix PTY master.
///
/// Reads are async. Once the last slave descriptor is closed, Linux reports
/// `EIO` on the master; this type turns that into an ordinary end of stream.
pub struct UnixPtyMaster {
    /// The master file descriptor wrapped for async I/O.
    async_fd: AsyncFd<OwnedFd>,
}

impl std::fmt::Debug for UnixPtyMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixPtyMaster")
            .field("fd", &self.async_fd.as_raw_fd())
            .finish()
    }
}

impl UnixPtyMaster {
    /// Open a new PTY master.
    ///
    /// Returns the master and the path of its slave side.
    ///
    /// # Errors
    ///
    /// Returns an error if PTY allocation fails.
    pub fn open() -> Result<(Self, String)> {
        let master_fd = openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY)
            .map_err(|e| PtyError::Create(os_error(e)))?;

        grantpt(&master_fd).map_err(|e| PtyError::Create(os_error(e)))?;
        unlockpt(&master_fd).map_err(|e| PtyError::Create(os_error(e)))?;

        let slave_name =
            ptsname(&master_fd, Vec::new()).map_err(|e| PtyError::Create(os_error(e)))?;
        let slave_path = slave_name
            .to_str()
            .map_err(|_| {
                PtyError::Create(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "invalid slave path encoding",
                ))
            })?
            .to_string();

        fcntl_setfl(&master_fd, OFlags::NONBLOCK).map_err(|e| PtyError::Create(os_error(e)))?;
        let fd_flags = fcntl_getfd(&master_fd).map_err(|e| PtyError::Create(os_error(e)))?;
        fcntl_setfd(&master_fd, fd_flags | FdFlags::CLOEXEC)
            .map_err(|e| PtyError::Create(os_error(e)))?;

        let async_fd = AsyncFd::new(master_fd).map_err(PtyError::Create)?;

        Ok((Self { async_fd }, slave_path))
    }

    /// Set the window size.
    pub fn set_window_size(&self, size: WindowSize) -> Result<()> {
        set_fd_window_size(self.async_fd.get_ref(), size)
    }

    /// Get the current window size.
    pub fn window_size(&self) -> Result<WindowSize> {
        let winsize = tcgetwinsize(self.async_fd.get_ref())
            .map_err(|e| PtyError::GetAttributes(os_error(e)))?;

        Ok(WindowSize {
            cols: winsize.ws_col,
            rows: winsize.ws_row,
            xpixel: winsize.ws_xpixel,
            ypixel: winsize.ws_ypixel,
        })
    }

    /// Duplicate the master descriptor.
    ///
    /// The copy shares the non-blocking flag with the original, so writers
    /// on it must handle `EAGAIN` (see [`FdWriter`](super::FdWriter)).
    pub fn try_clone_fd(&self) -> Result<OwnedFd> {
        rustix::io::fcntl_dupfd_cloexec(self.async_fd.get_ref(), 0).map_err(PtyError::from)
    }
}

/// Apply `size` to any terminal descriptor.
pub(crate) fn set_fd_window_size(fd: impl AsFd, size: WindowSize) -> Result<()> {
    let winsize = Winsize {
        ws_col: size.cols,
        ws_row: size.rows,
        ws_xpixel: size.xpixel,
        ws_ypixel: size.ypixel,
    };

    tcsetwinsize(fd, winsize).map_err(|e| PtyError::Resize(os_error(e)))
}

impl AsRawFd for UnixPtyMaster {
    fn as_raw_fd(&self) -> RawFd {
        self.async_fd.as_raw_fd()
    }
}

impl AsFd for UnixPtyMaster {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.async_fd.get_ref().as_fd()
    }
}

impl AsyncRead for UnixPtyMaster {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        loop {
            let mut guard = match self.async_fd.poll_read_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            };

            let unfilled = buf.initialize_unfilled();
            match rustix::io::read(self.async_fd.get_ref(), unfilled) {
                Ok(n) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Err(rustix::io::Errno::AGAIN) => {
                    guard.clear_ready();
                }
                Err(rustix::io::Errno::INTR) => {}
                // Slave side fully closed: end of stream.
                Err(rustix::io::Errno::IO) => return Poll::Ready(Ok(())),
                Err(e) => return Poll::Ready(Err(os_error(e))),
            }
        }
    }
}

/// Open the slave side of a PTY.
pub fn open_slave(path: &str) -> Result<OwnedFd> {
    use rustix::fs::{Mode, open};
    use std::path::Path;

    open(
        Path::new(path),
        OFlags::RDWR | OFlags::NOCTTY | OFlags::CLOEXEC,
        Mode::empty(),
    )
    .map_err(|e| PtyError::Create(os_error(e)))
}
