//! Recording a session into a document.

use std::path::Path;

use tracing::{debug, info};

use crate::asciicast::{Asciicast, DocumentStore, Env, Frame};
use crate::capture::{self, Capture};
use crate::config::{OPTIMAL_SIZE, RecordConfig};
use crate::error::Result;
use crate::stream::FrameStream;
use crate::terminal;

/// Runs a command under a capture backend and assembles the document.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    config: RecordConfig,
}

impl Recorder {
    /// Create a recorder.
    #[must_use]
    pub const fn new(config: RecordConfig) -> Self {
        Self { config }
    }

    /// The recording configuration.
    #[must_use]
    pub const fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// Record with the native backend attached to this process's terminal.
    pub async fn record(&self) -> Result<Asciicast> {
        let mut capture = capture::native()?;
        self.record_with(&mut capture).await
    }

    /// Record with the native backend and save the result at `path`.
    pub async fn record_to<S: DocumentStore>(&self, store: &S, path: &Path) -> Result<Asciicast> {
        let cast = self.record().await?;
        store.save(&cast, path)?;
        Ok(cast)
    }

    /// Record using `capture`.
    pub async fn record_with<C: Capture>(&self, capture: &mut C) -> Result<Asciicast> {
        let quiet = self.config.quiet;
        let command = self.config.effective_command();

        let size = terminal::size();
        if self.config.size.is_none() && size.exceeds(OPTIMAL_SIZE.cols, OPTIMAL_SIZE.rows) {
            terminal::warning(
                format!("Current terminal size is {size}. Optimal is {OPTIMAL_SIZE}."),
                quiet,
            );
        }

        terminal::notice("Asciicast recording started.", quiet);
        terminal::notice(r#"Hit Ctrl-D or type "exit" to finish."#, quiet);

        let mut stream = FrameStream::new(self.config.max_wait);
        capture.record(&command, &mut stream).await?;
        let tail = stream.close();

        terminal::notice("Asciicast recording finished.", quiet);

        let size = self.config.size.unwrap_or_else(terminal::size);
        let elapsed = stream.duration();
        let mut frames = stream.into_frames();
        if !tail.is_zero() {
            frames.push(Frame::new(tail.as_secs_f64(), Vec::new()));
        }
        info!(frames = frames.len(), ?elapsed, %size, "recording finished");

        let env = self.config.env.clone().unwrap_or_else(Env::capture);
        debug!(term = %env.term, shell = %env.shell, "recorded environment");

        Ok(Asciicast::new(size.cols, size.rows, frames)
            .with_command(command)
            .with_title(self.config.title.clone())
            .with_env(env))
    }
}
