//! Windows platform implementation.
//!
//! Windows consoles have no pty to sit behind, so capture reads the visible
//! screen buffer instead. [`WindowsConsole`] turns that buffer into
//! [`ScreenSnapshot`](crate::ScreenSnapshot)s.

mod console;

pub use console::{WindowsConsole, console_size};
