//! termcast: terminal session capture and replay
//!
//! This crate records what a command displays in a terminal, with timing,
//! into an asciicast v1 document, and plays such documents back.
//!
//! # Features
//!
//! - **Pseudo-terminal capture** on Unix via `termcast-pty`, with raw-mode
//!   handling, window-size propagation and interrupt-safe restoration
//! - **Console-buffer capture** on platforms without PTYs
//! - **Byte-faithful codec**: arbitrary output, including invalid UTF-8,
//!   survives a save/load cycle
//! - **Loading** from files, standard input, HTTP(S) and IPFS gateway paths,
//!   following HTML alternate links
//! - **Playback** with idle clamping and speed control
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use termcast::{RecordConfig, Recorder};
//!
//! #[tokio::main]
//! async fn main() -> termcast::Result<()> {
//!     let config = RecordConfig::new()
//!         .command("htop")
//!         .max_wait(Duration::from_secs(2));
//!     let cast = Recorder::new(config).record().await?;
//!     std::fs::write("htop.json", cast.encode()?)?;
//!     Ok(())
//! }
//! ```

pub mod asciicast;
pub mod blocking;
pub mod capture;
pub mod config;
pub mod error;
pub mod logging;
pub mod player;
pub mod recorder;
pub mod stream;
pub mod terminal;

pub use asciicast::{Asciicast, DocumentStore, Env, Frame, FsStore, Loader, Source};
#[cfg(unix)]
pub use capture::PtySession;
pub use capture::{Capture, ConsoleCaptureSession, NativeCapture, ScreenDiffer};
pub use config::{EnvConfig, LogFormat, LoggingConfig, PlayConfig, RecordConfig};
pub use error::{CastError, Result};
pub use player::Player;
pub use recorder::Recorder;
pub use stream::FrameStream;
pub use termcast_pty::WindowSize;
