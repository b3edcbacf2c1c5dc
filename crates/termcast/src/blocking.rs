//! Blocking wrappers for callers without an async runtime.
//!
//! Each function builds a current-thread Tokio runtime, runs the async
//! operation to completion on it and tears it down again.

use std::future::Future;
use std::path::Path;

use tokio::runtime::Builder;

use crate::asciicast::{Asciicast, DocumentStore, FsStore, Loader, Source};
use crate::config::{PlayConfig, RecordConfig};
use crate::error::{CastError, Result};
use crate::player::Player;
use crate::recorder::Recorder;
use crate::terminal::InterruptGuard;

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CastError::io_context("creating tokio runtime", e))?;
    Ok(runtime.block_on(future))
}

/// Record a session with the native backend.
pub fn record(config: RecordConfig) -> Result<Asciicast> {
    block_on(Recorder::new(config).record())?
}

/// Record a session and save it at `path`.
pub fn record_to_file(config: RecordConfig, path: &Path) -> Result<Asciicast> {
    block_on(Recorder::new(config).record_to(&FsStore::new(), path))?
}

/// Load the document at `location` (path, `-`, URL or gateway path).
pub fn load(location: &str) -> Result<Asciicast> {
    let source = Source::parse(location)?;
    block_on(async { Loader::new().load(&source).await })?
}

/// Play a document on stdout.
pub fn play(cast: &Asciicast, config: PlayConfig) -> Result<()> {
    let player = Player::new(config)?;
    let guard = InterruptGuard::for_playback()?;
    let played = player.play_to_stdout(cast);
    guard.uninstall();
    played
}

/// Load the document at `location` and play it on stdout.
pub fn play_source(location: &str, config: PlayConfig) -> Result<()> {
    config.validate()?;
    let cast = load(location)?;
    play(&cast, config)
}

/// Read a document saved by [`record_to_file`].
pub fn load_file(path: &Path) -> Result<Asciicast> {
    FsStore::new().load(path)
}
