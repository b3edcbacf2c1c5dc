//! Window-size propagation from the invoking terminal to a pty.

use std::os::unix::io::{AsFd, OwnedFd};
use std::sync::Arc;

use crate::config::WindowSize;
use crate::error::Result;
use crate::unix::pty::set_fd_window_size;
use crate::unix::signals::{SignalWatcher, on_window_change};
use crate::unix::tty::size_or_default;

/// Copy the size of `source` (or 24x80 if it is not a terminal) onto `target`.
pub fn propagate_size(source: impl AsFd, target: impl AsFd) -> Result<WindowSize> {
    let size = size_or_default(source);
    set_fd_window_size(target, size)?;
    Ok(size)
}

struct Endpoints {
    source: OwnedFd,
    target: OwnedFd,
}

impl Endpoints {
    fn sync(&self) {
        match propagate_size(&self.source, &self.target) {
            Ok(size) => tracing::trace!(%size, "propagated window size"),
            Err(e) => tracing::debug!(error = %e, "window size propagation failed"),
        }
    }
}

/// Re-applies the invoking terminal's size to a pty on every `SIGWINCH`.
///
/// Best effort: failures are logged at debug level and otherwise ignored.
pub struct ResizeWatcher {
    endpoints: Arc<Endpoints>,
    watcher: SignalWatcher,
}

impl std::fmt::Debug for ResizeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeWatcher")
            .field("closed", &self.watcher.is_closed())
            .finish()
    }
}

impl ResizeWatcher {
    /// Start watching. `source` is queried for its size, `target` receives it.
    pub fn start(source: impl AsFd, target: impl AsFd) -> Result<Self> {
        let endpoints = Arc::new(Endpoints {
            source: rustix::io::fcntl_dupfd_cloexec(source, 0)?,
            target: rustix::io::fcntl_dupfd_cloexec(target, 0)?,
        });

        let shared = Arc::clone(&endpoints);
        let watcher = on_window_change(move || shared.sync())?;

        Ok(Self { endpoints, watcher })
    }

    /// Propagate the current size immediately.
    pub fn resize_now(&self) {
        self.endpoints.sync();
    }

    /// Cancel the subscription. Safe to call more than once.
    pub fn stop(&mut self) {
        self.watcher.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FALLBACK_SIZE;
    use crate::unix::UnixPtyMaster;

    #[tokio::test]
    async fn non_tty_source_yields_fallback() {
        let Ok((master, _path)) = UnixPtyMaster::open() else {
            return;
        };
        master.set_window_size(WindowSize::new(10, 5)).unwrap();
        let (read, _write) = rustix::pipe::pipe().unwrap();

        let size = propagate_size(&read, &master).unwrap();
        assert_eq!(size, FALLBACK_SIZE);
        assert_eq!(master.window_size().unwrap(), FALLBACK_SIZE);
    }

    #[tokio::test]
    async fn watcher_resizes_now_and_stops_twice() {
        let Ok((master, _path)) = UnixPtyMaster::open() else {
            return;
        };
        master.set_window_size(WindowSize::new(10, 5)).unwrap();
        let (read, _write) = rustix::pipe::pipe().unwrap();

        let mut watcher = ResizeWatcher::start(&read, &master).unwrap();
        watcher.resize_now();
        assert_eq!(master.window_size().unwrap(), FALLBACK_SIZE);

        watcher.stop();
        watcher.stop();
    }
}
