//! Unix child process management for PTY.
//!
//! Spawns the recorded command on the slave side of a pty, as session
//! leader with the pty as its controlling terminal.

use std::ffi::OsStr;
use std::io;
use std::os::unix::io::{AsRawFd, OwnedFd};

use tokio::process::Child as TokioChild;

use crate::config::PtyConfig;
use crate::error::{PtyError, Result};
use crate::status::ExitStatus;

/// Unix child process handle.
pub struct UnixPtyChild {
    /// The underlying tokio child process.
    child: TokioChild,
    /// The process ID.
    pid: u32,
    /// Cached exit status.
    exit_status: Option<ExitStatus>,
}

impl std::fmt::Debug for UnixPtyChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixPtyChild")
            .field("pid", &self.pid)
            .field("exit_status", &self.exit_status)
            .finish()
    }
}

impl UnixPtyChild {
    fn new(child: TokioChild) -> Result<Self> {
        let pid = child.id().ok_or_else(|| {
            PtyError::Spawn(io::Error::other("child exited before its pid was read"))
        })?;
        Ok(Self {
            child,
            pid,
            exit_status: None,
        })
    }

    /// Get the process ID.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Check if the process is still running as far as this handle knows.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.exit_status.is_none()
    }

    /// Wait for the child process to exit and reap it.
    ///
    /// Cancel safe: dropping the future before completion loses nothing.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }

        let status = ExitStatus::from(self.child.wait().await.map_err(PtyError::Wait)?);
        self.exit_status = Some(status);
        tracing::debug!(pid = self.pid, %status, "child exited");
        Ok(status)
    }

    /// Try to get the exit status without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if let Some(status) = self.exit_status {
            return Ok(Some(status));
        }

        let status = self
            .child
            .try_wait()
            .map_err(PtyError::Wait)?
            .map(ExitStatus::from);
        self.exit_status = status;
        Ok(status)
    }

    /// Kill the child process (SIGKILL).
    pub fn kill(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        self.child.start_kill().map_err(PtyError::Signal)
    }
}

/// Spawn a child process in a PTY.
///
/// The child's stdin, stdout and stderr are all the slave side; the child
/// becomes a session leader with the slave as its controlling terminal.
#[allow(unsafe_code)]
pub async fn spawn_child<S, I>(
    slave_fd: OwnedFd,
    program: S,
    args: I,
    config: &PtyConfig,
) -> Result<UnixPtyChild>
where
    S: AsRef<OsStr>,
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    use std::process::Stdio;
    use tokio::process::Command;

    let slave_raw = slave_fd.as_raw_fd();

    let mut cmd = Command::new(program.as_ref());
    cmd.args(args);
    cmd.envs(config.env.iter().map(|(k, v)| (k, v)));

    let stdin = rustix::io::fcntl_dupfd_cloexec(&slave_fd, 0)?;
    let stdout = rustix::io::fcntl_dupfd_cloexec(&slave_fd, 0)?;
    let stderr = rustix::io::fcntl_dupfd_cloexec(&slave_fd, 0)?;
    cmd.stdin(Stdio::from(stdin));
    cmd.stdout(Stdio::from(stdout));
    cmd.stderr(Stdio::from(stderr));

    // SAFETY: setsid and ioctl are async-signal-safe; slave_raw stays open
    // until after spawn returns because slave_fd is owned by this frame.
    unsafe {
        cmd.pre_exec(move || {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }

            if libc::ioctl(slave_raw, libc::TIOCSCTTY as _, 0) == -1 {
                return Err(io::Error::last_os_error());
            }

            Ok(())
        });
    }

    let child = cmd.spawn().map_err(PtyError::Spawn)?;
    drop(slave_fd);

    tracing::debug!(pid = ?child.id(), "spawned child on pty");
    UnixPtyChild::new(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unix::{UnixPtyMaster, open_slave};

    #[tokio::test]
    async fn spawn_and_wait_true() {
        let Ok((_master, path)) = UnixPtyMaster::open() else {
            return;
        };
        let slave = open_slave(&path).unwrap();
        let config = PtyConfig::default();

        if let Ok(mut child) = spawn_child(slave, "true", std::iter::empty::<&str>(), &config).await
        {
            assert!(child.pid() > 0);
            let status = child.wait().await.unwrap();
            assert!(status.success());
            assert!(!child.is_running());
            // cached
            assert_eq!(child.wait().await.unwrap(), status);
            assert_eq!(child.try_wait().unwrap(), Some(status));
        }
    }

    #[tokio::test]
    async fn spawn_missing_program_fails() {
        let Ok((_master, path)) = UnixPtyMaster::open() else {
            return;
        };
        let slave = open_slave(&path).unwrap();
        let config = PtyConfig::default();

        let result = spawn_child(
            slave,
            "/nonexistent/termcast-test-binary",
            std::iter::empty::<&str>(),
            &config,
        )
        .await;
        assert!(matches!(result, Err(PtyError::Spawn(_))));
    }

    #[tokio::test]
    async fn kill_sleeping_child() {
        let Ok((_master, path)) = UnixPtyMaster::open() else {
            return;
        };
        let slave = open_slave(&path).unwrap();
        let config = PtyConfig::default();

        if let Ok(mut child) = spawn_child(slave, "sleep", ["5"], &config).await {
            child.kill().unwrap();
            let status = child.wait().await.unwrap();
            assert!(!status.success());
        }
    }
}
