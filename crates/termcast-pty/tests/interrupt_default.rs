//! Interrupt watchers must not outlive their scope.
//!
//! Each check re-runs this test binary as a child with a marker variable
//! set, lets the child raise the signal, and inspects how it exited.

#![cfg(unix)]

use std::os::unix::process::ExitStatusExt;
use std::process::Command;
use std::time::Duration;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::low_level::raise;
use termcast_pty::unix::on_interrupt;

const CHILD_MODE: &str = "TERMCAST_PTY_SIGNAL_CHILD";

/// Exit code a child uses when it is still alive after raising the signal.
const SURVIVED: i32 = 42;

fn run_child(test: &str) -> std::process::ExitStatus {
    Command::new(std::env::current_exe().unwrap())
        .args(["--exact", test, "--test-threads=1", "--nocapture"])
        .env(CHILD_MODE, "1")
        .output()
        .unwrap()
        .status
}

fn in_child() -> bool {
    std::env::var_os(CHILD_MODE).is_some()
}

#[test]
fn sigterm_terminates_after_watcher_closed() {
    if in_child() {
        let mut watcher = on_interrupt(|_| {}).unwrap();
        watcher.close();
        drop(watcher);
        raise(SIGTERM).unwrap();
        std::thread::sleep(Duration::from_secs(2));
        std::process::exit(SURVIVED);
    }
    let status = run_child("sigterm_terminates_after_watcher_closed");
    assert_eq!(status.signal(), Some(SIGTERM), "{status:?}");
}

#[test]
fn sigint_terminates_after_nested_watchers_closed() {
    if in_child() {
        let outer = on_interrupt(|_| {}).unwrap();
        let inner = on_interrupt(|_| {}).unwrap();
        drop(inner);
        drop(outer);
        raise(SIGINT).unwrap();
        std::thread::sleep(Duration::from_secs(2));
        std::process::exit(SURVIVED);
    }
    let status = run_child("sigint_terminates_after_nested_watchers_closed");
    assert_eq!(status.signal(), Some(SIGINT), "{status:?}");
}

#[test]
fn open_watcher_replaces_termination() {
    if in_child() {
        let (tx, rx) = std::sync::mpsc::channel();
        let outer = on_interrupt(move |signal| {
            let _ = tx.send(signal);
        })
        .unwrap();
        let inner = on_interrupt(|_| {}).unwrap();
        drop(inner);

        raise(SIGTERM).unwrap();
        let delivered = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(delivered, SIGTERM);
        drop(outer);
        std::process::exit(SURVIVED);
    }
    let status = run_child("open_watcher_replaces_termination");
    assert_eq!(status.code(), Some(SURVIVED), "{status:?}");
}
