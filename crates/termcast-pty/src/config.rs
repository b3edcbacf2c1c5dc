//! Configuration types for spawning a recorded child.
//!
//! [`PtyConfig`] describes what the child gets on top of the parent's
//! environment and its initial window; [`WindowSize`] is the terminal size
//! exchanged with the OS.

use std::ffi::OsString;

/// Configuration for spawning a child process under capture.
///
/// The child inherits the parent's environment; `env` entries are set on
/// top of it, later entries winning.
///
/// # Example
///
/// ```
/// use termcast_pty::PtyConfig;
///
/// let config = PtyConfig::builder()
///     .env("ASCIINEMA_REC", "1")
///     .window_size(80, 24)
///     .build();
/// assert_eq!(config.window_size.cols, 80);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PtyConfig {
    /// Variables added to the inherited environment.
    pub env: Vec<(OsString, OsString)>,

    /// Initial window size.
    pub window_size: WindowSize,
}

impl PtyConfig {
    /// Create a new builder for `PtyConfig`.
    #[must_use]
    pub fn builder() -> PtyConfigBuilder {
        PtyConfigBuilder::default()
    }
}

/// Builder for [`PtyConfig`].
#[derive(Debug, Clone, Default)]
pub struct PtyConfigBuilder {
    config: PtyConfig,
}

impl PtyConfigBuilder {
    /// Set an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.config.env.push((key.into(), value.into()));
        self
    }

    /// Set the initial window size.
    #[must_use]
    pub const fn window_size(mut self, cols: u16, rows: u16) -> Self {
        self.config.window_size = WindowSize::new(cols, rows);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PtyConfig {
        self.config
    }
}

/// Terminal window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Number of columns (characters per line).
    pub cols: u16,
    /// Number of rows (lines).
    pub rows: u16,
    /// Pixel width (optional, often 0).
    pub xpixel: u16,
    /// Pixel height (optional, often 0).
    pub ypixel: u16,
}

impl WindowSize {
    /// Create a new window size with the given dimensions.
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            xpixel: 0,
            ypixel: 0,
        }
    }

    /// True when either dimension exceeds the given bounds.
    #[must_use]
    pub const fn exceeds(&self, cols: u16, rows: u16) -> bool {
        self.cols > cols || self.rows > rows
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl From<(u16, u16)> for WindowSize {
    fn from((cols, rows): (u16, u16)) -> Self {
        Self::new(cols, rows)
    }
}

impl std::fmt::Display for WindowSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}
