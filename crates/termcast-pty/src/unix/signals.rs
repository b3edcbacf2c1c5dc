//! Signal watching on dedicated threads.
//!
//! A [`SignalWatcher`] owns a `signal-hook` iterator running on its own
//! thread and invokes a callback for every delivery. Closing the watcher
//! wakes the thread, so teardown does not wait for another signal.
//!
//! `signal-hook` never uninstalls its low-level handler. For `SIGINT` and
//! `SIGTERM` a conditional default action is registered alongside, enabled
//! whenever no interrupt watcher is open, so the process still terminates
//! on those signals once every watcher has been closed.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::thread::JoinHandle;

use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
use signal_hook::iterator::{Handle, Signals};

const INTERRUPT_SIGNALS: [i32; 2] = [SIGINT, SIGTERM];

/// Open interrupt watchers and the flag that re-enables default termination.
struct InterruptState {
    open: usize,
    defaults_registered: bool,
    run_default: Arc<AtomicBool>,
}

static INTERRUPTS: LazyLock<Mutex<InterruptState>> = LazyLock::new(|| {
    Mutex::new(InterruptState {
        open: 0,
        defaults_registered: false,
        run_default: Arc::new(AtomicBool::new(true)),
    })
});

fn acquire_interrupts() -> io::Result<()> {
    let mut state = INTERRUPTS.lock().unwrap_or_else(PoisonError::into_inner);
    if !state.defaults_registered {
        for signal in INTERRUPT_SIGNALS {
            signal_hook::flag::register_conditional_default(signal, Arc::clone(&state.run_default))?;
        }
        state.defaults_registered = true;
    }
    state.open += 1;
    state.run_default.store(false, Ordering::SeqCst);
    Ok(())
}

fn release_interrupts() {
    let mut state = INTERRUPTS.lock().unwrap_or_else(PoisonError::into_inner);
    state.open = state.open.saturating_sub(1);
    if state.open == 0 {
        state.run_default.store(true, Ordering::SeqCst);
    }
}

/// A running signal subscription.
pub struct SignalWatcher {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
    holds_interrupts: bool,
}

impl std::fmt::Debug for SignalWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalWatcher")
            .field("closed", &self.handle.is_closed())
            .finish_non_exhaustive()
    }
}

impl SignalWatcher {
    /// Subscribe to `signals`, calling `callback` with each delivered number.
    ///
    /// # Errors
    ///
    /// Returns an error if signal registration or thread creation fails.
    pub fn spawn<F>(signals: &[i32], name: &str, mut callback: F) -> io::Result<Self>
    where
        F: FnMut(i32) + Send + 'static,
    {
        let mut signals = Signals::new(signals)?;
        let handle = signals.handle();

        let thread = std::thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                for signal in signals.forever() {
                    callback(signal);
                }
            })?;

        Ok(Self {
            handle,
            thread: Some(thread),
            holds_interrupts: false,
        })
    }

    /// Stop delivering signals and join the thread. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.handle.close();
        if std::mem::take(&mut self.holds_interrupts) {
            release_interrupts();
        }
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() == std::thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                tracing::warn!("signal watcher thread panicked");
            }
        }
    }

    /// Whether [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

impl Drop for SignalWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

/// Call `callback` every time the terminal window changes size.
pub fn on_window_change<F>(mut callback: F) -> io::Result<SignalWatcher>
where
    F: FnMut() + Send + 'static,
{
    SignalWatcher::spawn(&[SIGWINCH], "pty-sigwinch-handler", move |_| callback())
}

/// Call `callback` on `SIGINT` or `SIGTERM`.
///
/// While any such watcher is open the default "terminate" action is
/// replaced by the callbacks; once the last one closes, both signals
/// terminate the process again.
pub fn on_interrupt<F>(callback: F) -> io::Result<SignalWatcher>
where
    F: FnMut(i32) + Send + 'static,
{
    acquire_interrupts()?;
    match SignalWatcher::spawn(&INTERRUPT_SIGNALS, "pty-interrupt-handler", callback) {
        Ok(mut watcher) => {
            watcher.holds_interrupts = true;
            Ok(watcher)
        }
        Err(e) => {
            release_interrupts();
            Err(e)
        }
    }
}
