//! Cancellable byte copying.
//!
//! The stdin direction of a session waits in `poll(2)` on both the source
//! descriptor and the read end of a private pipe. Writing one byte into the
//! pipe ([`Canceller::cancel`]) wakes the loop even when the source is idle.

use std::io::{self, Write};
use std::os::unix::io::{AsFd, BorrowedFd, OwnedFd};
use std::sync::Arc;

use rustix::event::{PollFd, PollFlags, poll};
use rustix::io::{Errno, FdFlags, fcntl_getfd, fcntl_setfd};

use crate::COPY_BUFFER_SIZE;
use crate::error::os_error;

/// Sending half of a cancellation pipe.
#[derive(Debug, Clone)]
pub struct Canceller {
    write: Arc<OwnedFd>,
}

/// Receiving half of a cancellation pipe.
#[derive(Debug)]
pub struct CancelToken {
    read: OwnedFd,
}

/// Create a connected [`Canceller`] / [`CancelToken`] pair.
pub fn cancel_pair() -> io::Result<(Canceller, CancelToken)> {
    let (read, write) = rustix::pipe::pipe().map_err(os_error)?;
    for fd in [&read, &write] {
        let flags = fcntl_getfd(fd).map_err(os_error)?;
        fcntl_setfd(fd, flags | FdFlags::CLOEXEC).map_err(os_error)?;
    }
    Ok((
        Canceller {
            write: Arc::new(write),
        },
        CancelToken { read },
    ))
}

impl Canceller {
    /// Signal cancellation. Repeated calls are harmless.
    pub fn cancel(&self) -> io::Result<()> {
        loop {
            match rustix::io::write(&*self.write, &[1]) {
                Ok(_) => return Ok(()),
                Err(Errno::INTR) => {}
                // Reader gone or pipe full: already cancelled either way.
                Err(Errno::PIPE | Errno::AGAIN) => return Ok(()),
                Err(e) => return Err(os_error(e)),
            }
        }
    }
}

impl CancelToken {
    /// Whether cancellation has been signalled, without blocking.
    pub fn is_cancelled(&self) -> io::Result<bool> {
        let mut fds = [PollFd::new(&self.read, PollFlags::IN)];
        let zero = rustix::event::Timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        loop {
            match poll(&mut fds, Some(&zero)) {
                Ok(n) => return Ok(n > 0),
                Err(Errno::INTR) => {}
                Err(e) => return Err(os_error(e)),
            }
        }
    }
}

/// Copy from `src` to `dst` until end of stream or until `token` fires.
///
/// Reads at most [`COPY_BUFFER_SIZE`] bytes at a time. A `dst` that accepts
/// fewer bytes than offered fails with [`io::ErrorKind::WriteZero`].
/// Returns the number of bytes copied.
pub fn copy_until_cancelled<W>(
    src: BorrowedFd<'_>,
    dst: &mut W,
    token: &CancelToken,
) -> io::Result<u64>
where
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let mut fds = [
            PollFd::new(&src, PollFlags::IN),
            PollFd::new(&token.read, PollFlags::IN),
        ];
        match poll(&mut fds, None) {
            Ok(_) => {}
            Err(Errno::INTR) => continue,
            Err(e) => return Err(os_error(e)),
        }

        if !fds[1].revents().is_empty() {
            tracing::trace!(total, "copy cancelled");
            return Ok(total);
        }

        let revents = fds[0].revents();
        if revents.contains(PollFlags::NVAL) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "source descriptor is not open",
            ));
        }
        if revents.is_empty() {
            continue;
        }

        let n = match rustix::io::read(src, &mut buf[..]) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(Errno::INTR | Errno::AGAIN) => continue,
            Err(e) => return Err(os_error(e)),
        };

        write_chunk(dst, &buf[..n])?;
        total += n as u64;
    }
}

/// Write all of `chunk` with a single call; anything less is an error.
pub(crate) fn write_chunk<W: Write + ?Sized>(dst: &mut W, chunk: &[u8]) -> io::Result<()> {
    let written = dst.write(chunk)?;
    if written != chunk.len() {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("short write: {written} of {} bytes", chunk.len()),
        ));
    }
    Ok(())
}

/// Blocking writer over a possibly non-blocking descriptor.
///
/// Each `write` call delivers the whole buffer, waiting for `POLLOUT` when
/// the descriptor reports `EAGAIN`.
#[derive(Debug)]
pub struct FdWriter {
    fd: OwnedFd,
}

impl FdWriter {
    /// Wrap `fd`.
    #[must_use]
    pub const fn new(fd: OwnedFd) -> Self {
        Self { fd }
    }

    fn wait_writable(&self) -> io::Result<()> {
        let mut fds = [PollFd::new(&self.fd, PollFlags::OUT)];
        loop {
            match poll(&mut fds, None) {
                Ok(_) => return Ok(()),
                Err(Errno::INTR) => {}
                Err(e) => return Err(os_error(e)),
            }
        }
    }
}

impl Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut offset = 0;
        while offset < buf.len() {
            match rustix::io::write(&self.fd, &buf[offset..]) {
                Ok(0) => break,
                Ok(n) => offset += n,
                Err(Errno::AGAIN) => self.wait_writable()?,
                Err(Errno::INTR) => {}
                Err(e) => return Err(os_error(e)),
            }
        }
        Ok(offset)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsFd for FdWriter {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct HalfWriter;

    impl Write for HalfWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len() / 2)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn copies_until_eof() {
        let (read, write) = rustix::pipe::pipe().unwrap();
        let (_canceller, token) = cancel_pair().unwrap();

        rustix::io::write(&write, b"hello").unwrap();
        drop(write);

        let mut out = Vec::new();
        let n = copy_until_cancelled(read.as_fd(), &mut out, &token).unwrap();
        assert_eq!(n, 5);
        assert_eq!(out, b"hello");
    }

    #[test]
    fn short_write_is_an_error() {
        let (read, write) = rustix::pipe::pipe().unwrap();
        let (_canceller, token) = cancel_pair().unwrap();
        rustix::io::write(&write, b"abcd").unwrap();

        let err = copy_until_cancelled(read.as_fd(), &mut HalfWriter, &token).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn cancel_before_start_returns_immediately() {
        let (read, _write) = rustix::pipe::pipe().unwrap();
        let (canceller, token) = cancel_pair().unwrap();
        canceller.cancel().unwrap();
        canceller.cancel().unwrap();
        assert!(token.is_cancelled().unwrap());

        let start = Instant::now();
        let n = copy_until_cancelled(read.as_fd(), &mut Vec::new(), &token).unwrap();
        assert_eq!(n, 0);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn fd_writer_delivers_whole_buffer() {
        let (read, write) = rustix::pipe::pipe().unwrap();
        let mut writer = FdWriter::new(write);
        assert_eq!(writer.write(b"xyz").unwrap(), 3);
        drop(writer);

        let mut buf = [0u8; 8];
        let n = rustix::io::read(&read, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"xyz");
    }
}
