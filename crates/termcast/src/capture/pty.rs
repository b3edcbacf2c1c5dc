//! Pseudo-terminal capture.
//!
//! The command runs on the slave side of a fresh pty. Its output is read
//! from the master and written both to the user's terminal and to the sink;
//! the user's keystrokes are copied to the master by a dedicated thread that
//! can be cancelled once the command exits.

use std::io::{self, Write};
use std::os::fd::{AsFd, OwnedFd};
use std::time::Duration;

use termcast_pty::{
    COPY_BUFFER_SIZE, FdWriter, PtyConfig, RawModeGuard, ResizeWatcher, UnixPtyChild,
    UnixPtyMaster, UnixPtySystem, cancel_pair, copy_until_cancelled, is_terminal,
    size_or_default,
};
use tokio::io::AsyncReadExt;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use super::{Capture, REC_ENV_VAR, shell_wrapper};
use crate::error::{CastError, Result};
use crate::terminal::InterruptGuard;

/// How long output may keep draining after the command exits.
pub const GRACE_PERIOD: Duration = Duration::from_millis(200);

/// Records a command running in a pseudo-terminal.
pub struct PtySession {
    input: Option<OwnedFd>,
    output: Box<dyn Write + Send>,
    grace_period: Duration,
}

impl std::fmt::Debug for PtySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtySession")
            .field("input", &self.input)
            .field("grace_period", &self.grace_period)
            .finish_non_exhaustive()
    }
}

impl Default for PtySession {
    fn default() -> Self {
        Self::new()
    }
}

impl PtySession {
    /// A session wired to the process's stdin and stdout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: None,
            output: Box::new(io::stdout()),
            grace_period: GRACE_PERIOD,
        }
    }

    /// Read keystrokes from `fd` instead of stdin.
    #[must_use]
    pub fn input(mut self, fd: OwnedFd) -> Self {
        self.input = Some(fd);
        self
    }

    /// Show the command's output on `output` instead of stdout.
    #[must_use]
    pub fn output<W: Write + Send + 'static>(mut self, output: W) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Set the post-exit drain bound.
    #[must_use]
    pub const fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    fn input_fd(&self) -> Result<OwnedFd> {
        let fd = match &self.input {
            Some(fd) => fd.try_clone(),
            None => io::stdin().as_fd().try_clone_to_owned(),
        };
        CastError::with_io_context(fd, "duplicating input descriptor")
    }

    async fn run<W: Write + Send>(&mut self, command: &str, sink: &mut W) -> Result<()> {
        let input = self.input_fd()?;
        let size = size_or_default(io::stdout());
        let config = PtyConfig::builder()
            .env(REC_ENV_VAR, "1")
            .window_size(size.cols, size.rows)
            .build();

        let (program, args) = shell_wrapper(command);
        let (mut master, mut child) = UnixPtySystem::spawn(program, args, &config).await?;
        debug!(pid = child.pid(), command, %size, "recording started");

        let mut resize = match ResizeWatcher::start(io::stdout(), &master) {
            Ok(resize) => resize,
            Err(e) => {
                abort(&mut child).await;
                return Err(e.into());
            }
        };

        let mut raw = None;
        if is_terminal(&input) {
            match RawModeGuard::enter(&input) {
                Ok(guard) => raw = Some(guard),
                Err(e) => {
                    resize.stop();
                    abort(&mut child).await;
                    return Err(e.into());
                }
            }
        }
        let interrupt = match raw.as_ref().map(RawModeGuard::restorer).transpose() {
            Ok(restorer) => InterruptGuard::install(restorer),
            Err(e) => Err(e.into()),
        };

        resize.resize_now();

        let outcome = match interrupt {
            Ok(_interrupt) => self.pump(input, &mut master, &mut child, sink).await,
            Err(e) => {
                abort(&mut child).await;
                Err(e)
            }
        };

        resize.stop();
        if let Some(mut guard) = raw
            && let Err(e) = guard.restore()
        {
            warn!(error = %e, "failed to restore terminal mode");
        }
        outcome
    }

    /// Copy in both directions until the child exits, then drain.
    async fn pump<W: Write + Send>(
        &mut self,
        input: OwnedFd,
        master: &mut UnixPtyMaster,
        child: &mut UnixPtyChild,
        sink: &mut W,
    ) -> Result<()> {
        let (canceller, token) =
            CastError::with_io_context(cancel_pair(), "creating cancellation pipe")?;
        let mut to_child = FdWriter::new(master.try_clone_fd()?);

        let (done_tx, mut done_rx) = oneshot::channel();
        let spawned = std::thread::Builder::new()
            .name("termcast-stdin".into())
            .spawn(move || {
                let result = copy_until_cancelled(input.as_fd(), &mut to_child, &token);
                let _ = done_tx.send(result);
            });
        if let Err(e) = spawned {
            abort(child).await;
            return Err(CastError::io_context("spawning input thread", e));
        }

        let grace_period = self.grace_period;
        let output = copy_output(master, self.output.as_mut(), sink);
        tokio::pin!(output);

        let mut output_open = true;
        let mut input_open = true;
        let waited = loop {
            tokio::select! {
                status = child.wait() => break status.map_err(CastError::from),
                result = &mut output, if output_open => {
                    output_open = false;
                    match result {
                        Ok(total) => trace!(total, "child output closed before exit"),
                        Err(e) => break Err(CastError::io_context("copying child output", e)),
                    }
                }
                result = &mut done_rx, if input_open => {
                    input_open = false;
                    match result {
                        Ok(Ok(total)) => trace!(total, "input closed"),
                        Ok(Err(e)) => break Err(CastError::io_context("copying input to child", e)),
                        Err(_) => debug!("input thread exited without a result"),
                    }
                }
            }
        };

        if let Err(e) = canceller.cancel() {
            debug!(error = %e, "failed to cancel input copy");
        }

        let status = match waited {
            Ok(status) => status,
            Err(e) => {
                abort(child).await;
                return Err(e);
            }
        };
        debug!(%status, "command exited");

        if output_open {
            match tokio::time::timeout(grace_period, &mut output).await {
                Ok(Ok(total)) => trace!(total, "output drained"),
                Ok(Err(e)) => debug!(error = %e, "output copy failed after exit"),
                Err(_) => debug!(?grace_period, "output still open after grace period"),
            }
        }

        Ok(())
    }
}

impl Capture for PtySession {
    async fn record<W: Write + Send>(&mut self, command: &str, sink: &mut W) -> Result<()> {
        self.run(command, sink).await
    }
}

/// Kill and reap a child after a failure.
async fn abort(child: &mut UnixPtyChild) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "failed to kill child");
    }
    if let Err(e) = child.wait().await {
        debug!(error = %e, "failed to reap child");
    }
}

/// Copy pty output to the terminal and the sink until end of stream.
///
/// Each chunk goes to the sink in a single write; accepting less is an
/// error.
async fn copy_output<W: Write + ?Sized>(
    master: &mut UnixPtyMaster,
    terminal: &mut (dyn Write + Send),
    sink: &mut W,
) -> io::Result<u64> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = master.read(&mut buf).await?;
        if n == 0 {
            return Ok(total);
        }
        let chunk = &buf[..n];

        terminal.write_all(chunk)?;
        terminal.flush()?;

        let written = sink.write(chunk)?;
        if written != n {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write to sink: {written} of {n} bytes"),
            ));
        }
        total += n as u64;
    }
}
