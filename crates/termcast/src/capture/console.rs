//! Console screen-buffer capture.
//!
//! Without a pty there is no output stream to tap. Instead the visible
//! console window is polled every [`POLL_INTERVAL`] and compared with the
//! previous poll; rows that changed are repainted with synthesized escape
//! sequences, which are what ends up in the sink.

use std::fmt::Write as _;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use termcast_pty::{CellAttributes, PtyError, ScreenRow, ScreenSnapshot, ScreenSource};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::{Capture, REC_ENV_VAR, shell_wrapper};
use crate::error::{CastError, Result};

/// Time between two screen polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// ANSI colour offsets indexed by console colour bits (blue=1, green=2, red=4).
const ANSI_COLORS: [u16; 8] = [0, 4, 2, 6, 1, 5, 3, 7];

/// SGR parameters equivalent to a console attribute.
fn sgr(attrs: CellAttributes) -> (u16, u16) {
    let fg = attrs.foreground();
    let bg = attrs.background();
    let fg_base = if fg & 0x8 == 0 { 30 } else { 90 };
    let bg_base = if bg & 0x8 == 0 { 40 } else { 100 };
    (
        fg_base + ANSI_COLORS[usize::from(fg & 0x7)],
        bg_base + ANSI_COLORS[usize::from(bg & 0x7)],
    )
}

/// Turns successive screen snapshots into escape sequences that repaint the
/// differences.
#[derive(Debug, Default)]
pub struct ScreenDiffer {
    previous: Option<ScreenSnapshot>,
}

impl ScreenDiffer {
    /// A differ with no baseline; the first snapshot is painted in full.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes that turn the previous snapshot into `snapshot`.
    ///
    /// Empty when nothing visible changed.
    pub fn diff(&mut self, snapshot: ScreenSnapshot) -> Vec<u8> {
        let mut out = String::new();

        let baseline = self
            .previous
            .as_ref()
            .filter(|previous| previous.size == snapshot.size);

        for (y, row) in snapshot.rows.iter().enumerate() {
            let unchanged = baseline
                .and_then(|previous| previous.rows.get(y))
                .is_some_and(|old| old == row);
            if !unchanged {
                paint_row(&mut out, y, row);
            }
        }

        let (old_cursor, old_visible) = self
            .previous
            .as_ref()
            .map_or(((0, 0), false), |p| ((p.cursor_x, p.cursor_y), p.cursor_visible));

        if old_cursor != (snapshot.cursor_x, snapshot.cursor_y) {
            let _ = write!(
                out,
                "\x1b[{};{}H",
                u32::from(snapshot.cursor_y) + 1,
                u32::from(snapshot.cursor_x) + 1
            );
        }
        if old_visible != snapshot.cursor_visible {
            out.push_str(if snapshot.cursor_visible {
                "\x1b[?25h"
            } else {
                "\x1b[?25l"
            });
        }

        self.previous = Some(snapshot);
        out.into_bytes()
    }
}

fn paint_row(out: &mut String, y: usize, row: &ScreenRow) {
    let _ = write!(out, "\x1b[{};1H\x1b[0K", y + 1);
    let mut current = None;
    for cell in &row.cells {
        if current != Some(cell.attrs) {
            current = Some(cell.attrs);
            let (fg, bg) = sgr(cell.attrs);
            let _ = write!(out, "\x1b[{fg};{bg}m");
        }
        out.push(cell.ch);
    }
    out.push_str("\x1b[0m");
}

/// Records a command by polling a console screen buffer.
#[derive(Debug)]
pub struct ConsoleCaptureSession<S> {
    source: S,
    differ: ScreenDiffer,
    interval: Duration,
}

impl<S: ScreenSource> ConsoleCaptureSession<S> {
    /// Poll `source` every [`POLL_INTERVAL`].
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            differ: ScreenDiffer::new(),
            interval: POLL_INTERVAL,
        }
    }

    /// Set the poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Take one snapshot and write whatever changed to `sink`.
    ///
    /// A failed snapshot is skipped; a failed write is an error.
    pub fn poll<W: Write + ?Sized>(&mut self, sink: &mut W) -> std::io::Result<()> {
        let snapshot = match self.source.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "screen snapshot failed");
                return Ok(());
            }
        };
        let bytes = self.differ.diff(snapshot);
        if bytes.is_empty() {
            return Ok(());
        }
        let written = sink.write(&bytes)?;
        if written != bytes.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short write to sink: {written} of {} bytes", bytes.len()),
            ));
        }
        Ok(())
    }
}

impl<S: ScreenSource> Capture for ConsoleCaptureSession<S> {
    async fn record<W: Write + Send>(&mut self, command: &str, sink: &mut W) -> Result<()> {
        let (program, args) = shell_wrapper(command);
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .env(REC_ENV_VAR, "1")
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| CastError::Spawn(PtyError::Spawn(e)))?;
        debug!(pid = ?child.id(), command, "recording started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                status = child.wait() => {
                    let status = CastError::with_io_context(status, "waiting for command")?;
                    debug!(%status, "command exited");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll(sink) {
                        if let Err(kill) = child.kill().await {
                            debug!(error = %kill, "failed to kill child");
                        }
                        return Err(CastError::io_context("writing screen changes", e));
                    }
                }
            }
        }

        CastError::with_io_context(self.poll(sink), "writing screen changes")
    }
}
