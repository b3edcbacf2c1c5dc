//! Plain-data view of a console screen buffer.
//!
//! The polling capture backend works on [`ScreenSnapshot`]s produced by a
//! [`ScreenSource`]. On Windows the source is the real console; tests and
//! other platforms can supply their own.

use bitflags::bitflags;

use crate::config::WindowSize;
use crate::error::Result;

bitflags! {
    /// Console character attributes, bit-compatible with the Win32 console.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellAttributes: u16 {
        /// Blue foreground.
        const FOREGROUND_BLUE = 0x0001;
        /// Green foreground.
        const FOREGROUND_GREEN = 0x0002;
        /// Red foreground.
        const FOREGROUND_RED = 0x0004;
        /// Bright foreground.
        const FOREGROUND_INTENSITY = 0x0008;
        /// Blue background.
        const BACKGROUND_BLUE = 0x0010;
        /// Green background.
        const BACKGROUND_GREEN = 0x0020;
        /// Red background.
        const BACKGROUND_RED = 0x0040;
        /// Bright background.
        const BACKGROUND_INTENSITY = 0x0080;

        const _ = !0;
    }
}

impl CellAttributes {
    /// The usual console default: light grey on black.
    pub const DEFAULT: Self = Self::FOREGROUND_RED
        .union(Self::FOREGROUND_GREEN)
        .union(Self::FOREGROUND_BLUE);

    /// Foreground colour index, 0-15.
    #[must_use]
    pub const fn foreground(self) -> u16 {
        self.bits() & 0x0f
    }

    /// Background colour index, 0-15.
    #[must_use]
    pub const fn background(self) -> u16 {
        (self.bits() >> 4) & 0x0f
    }
}

/// One character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The displayed character.
    pub ch: char,
    /// Its colour attributes.
    pub attrs: CellAttributes,
}

impl Cell {
    /// Create a cell.
    #[must_use]
    pub const fn new(ch: char, attrs: CellAttributes) -> Self {
        Self { ch, attrs }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(' ', CellAttributes::DEFAULT)
    }
}

/// One visible row of the screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenRow {
    /// Cells from left to right.
    pub cells: Vec<Cell>,
}

impl ScreenRow {
    /// Build a row of `text` with uniform attributes.
    #[must_use]
    pub fn from_text(text: &str, attrs: CellAttributes) -> Self {
        Self {
            cells: text.chars().map(|ch| Cell::new(ch, attrs)).collect(),
        }
    }
}

/// The visible window of a screen buffer at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenSnapshot {
    /// Visible size.
    pub size: WindowSize,
    /// Visible rows, top to bottom.
    pub rows: Vec<ScreenRow>,
    /// Cursor column relative to the visible window, zero based.
    pub cursor_x: u16,
    /// Cursor row relative to the visible window, zero based.
    pub cursor_y: u16,
    /// Whether the cursor is shown.
    pub cursor_visible: bool,
}

/// Anything that can produce screen snapshots.
pub trait ScreenSource: Send {
    /// Capture the current visible screen.
    fn snapshot(&mut self) -> Result<ScreenSnapshot>;
}
