//! Turning a stream of writes into timed frames.

use std::io;
use std::time::{Duration, Instant};

use crate::asciicast::Frame;

/// An [`io::Write`] sink that timestamps every write as a [`Frame`].
///
/// Each frame's delay is the time since the previous write (or since the
/// stream was created), clamped to `max_wait` when that is non-zero. The
/// running total of clamped delays is [`FrameStream::duration`].
#[derive(Debug)]
pub struct FrameStream {
    frames: Vec<Frame>,
    elapsed: Duration,
    last_write: Instant,
    max_wait: Duration,
}

impl FrameStream {
    /// Create a stream; zero `max_wait` disables clamping.
    #[must_use]
    pub fn new(max_wait: Duration) -> Self {
        Self::starting_at(max_wait, Instant::now())
    }

    /// Create a stream whose first delay is measured from `start`.
    #[must_use]
    pub const fn starting_at(max_wait: Duration, start: Instant) -> Self {
        Self {
            frames: Vec::new(),
            elapsed: Duration::ZERO,
            last_write: start,
            max_wait,
        }
    }

    /// Record `data` as a frame written now.
    pub fn write_chunk(&mut self, data: &[u8]) {
        self.write_chunk_at(data, Instant::now());
    }

    /// Record `data` as a frame written at `now`.
    pub fn write_chunk_at(&mut self, data: &[u8], now: Instant) {
        let delay = self.advance(now);
        self.frames.push(Frame::new(delay.as_secs_f64(), data));
    }

    /// Account for the idle time since the last write and return it.
    ///
    /// The returned delay is clamped like any other and is already included
    /// in [`FrameStream::duration`].
    pub fn close(&mut self) -> Duration {
        self.close_at(Instant::now())
    }

    /// [`FrameStream::close`] at an explicit instant.
    pub fn close_at(&mut self, now: Instant) -> Duration {
        self.advance(now)
    }

    /// Sum of all clamped delays so far.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.elapsed
    }

    /// Frames recorded so far.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The configured clamp.
    #[must_use]
    pub const fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Take the recorded frames.
    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    fn advance(&mut self, now: Instant) -> Duration {
        let mut delay = now.saturating_duration_since(self.last_write);
        if !self.max_wait.is_zero() && delay > self.max_wait {
            delay = self.max_wait;
        }
        self.elapsed += delay;
        self.last_write = now;
        delay
    }
}

impl io::Write for FrameStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_chunk(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
