//! Replaying a document in real time.

use std::io::{self, Write};
use std::time::Duration;

use tracing::trace;

use crate::asciicast::{Asciicast, Frame};
use crate::config::PlayConfig;
use crate::error::{CastError, Result};

/// Writes frames to a terminal with their recorded timing.
#[derive(Debug, Clone, Default)]
pub struct Player {
    config: PlayConfig,
}

impl Player {
    /// Create a player.
    ///
    /// # Errors
    ///
    /// `Config` if the speed is not a positive number.
    pub fn new(config: PlayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The playback configuration.
    #[must_use]
    pub const fn config(&self) -> &PlayConfig {
        &self.config
    }

    /// How long to wait before showing `frame`.
    #[must_use]
    pub fn pause_before(&self, frame: &Frame) -> Duration {
        let recorded = Duration::try_from_secs_f64(frame.delay).unwrap_or(Duration::ZERO);
        let clamped = if self.config.max_wait.is_zero() {
            recorded
        } else {
            recorded.min(self.config.max_wait)
        };
        Duration::try_from_secs_f64(clamped.as_secs_f64() / self.config.speed)
            .unwrap_or(Duration::MAX)
    }

    /// Play `cast` to `out`, frame by frame.
    ///
    /// Stops at the first write error.
    pub fn play<W: Write + ?Sized>(&self, cast: &Asciicast, out: &mut W) -> Result<()> {
        for (index, frame) in cast.frames.iter().enumerate() {
            let pause = self.pause_before(frame);
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
            trace!(index, bytes = frame.data.len(), "frame");
            out.write_all(&frame.data)
                .and_then(|()| out.flush())
                .map_err(|e| CastError::io_context(format!("writing frame {index}"), e))?;
        }
        Ok(())
    }

    /// Play `cast` on stdout.
    pub fn play_to_stdout(&self, cast: &Asciicast) -> Result<()> {
        self.play(cast, &mut io::stdout().lock())
    }
}
