//! The asciicast v1 document and its JSON codec.
//!
//! A document is a single pretty-printed JSON object:
//!
//! ```text
//! {
//!   "version": 1,
//!   "width": 80,
//!   "height": 24,
//!   "duration": 1.234560,
//!   "command": "/bin/bash",
//!   "title": "",
//!   "env": {
//!     "TERM": "xterm-256color",
//!     "SHELL": "/bin/bash"
//!   },
//!   "stdout": [
//!     [0.000005, "hello"],
//!     [0.010000, "world"]
//!   ]
//! }
//! ```
//!
//! Frame text uses the byte-preserving escaping of [`frame::escape_bytes`],
//! so decoding gives back exactly the bytes that were recorded.

pub mod frame;
pub mod loader;
pub mod store;

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

pub use frame::{Frame, escape_bytes, unescape_literal};
pub use loader::{Loader, Source};
pub use store::{DocumentStore, FsStore};

use crate::config::env::{current_shell, term_type};
use crate::error::{CastError, Result};

/// The only document version this codec reads and writes.
pub const VERSION: u32 = 1;

/// Environment recorded alongside a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Env {
    /// Value of `TERM`.
    #[serde(rename = "TERM", default)]
    pub term: String,

    /// Value of `SHELL`.
    #[serde(rename = "SHELL", default)]
    pub shell: String,
}

impl Env {
    /// Create an environment record.
    #[must_use]
    pub fn new(term: impl Into<String>, shell: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            shell: shell.into(),
        }
    }

    /// Read `TERM` and `SHELL` from the process environment.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            term: term_type().unwrap_or_default(),
            shell: current_shell().unwrap_or_default(),
        }
    }
}

/// A recorded terminal session.
#[derive(Debug, Clone, PartialEq)]
pub struct Asciicast {
    /// Format version, always [`VERSION`].
    pub version: u32,
    /// Terminal width in columns.
    pub width: u16,
    /// Terminal height in rows.
    pub height: u16,
    /// Total length in seconds.
    pub duration: f64,
    /// Command that was recorded.
    pub command: String,
    /// Free-form title.
    pub title: String,
    /// Recorded environment.
    pub env: Env,
    /// Output frames in order.
    pub frames: Vec<Frame>,
}

impl Asciicast {
    /// Create a document whose duration is the sum of the frame delays.
    #[must_use]
    pub fn new(width: u16, height: u16, frames: Vec<Frame>) -> Self {
        let duration = frames.iter().map(|f| f.delay).sum();
        Self {
            version: VERSION,
            width,
            height,
            duration,
            command: String::new(),
            title: String::new(),
            env: Env::default(),
            frames,
        }
    }

    /// Set the command.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the recorded environment.
    #[must_use]
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    /// Encode to pretty-printed JSON.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(256 + self.frames.len() * 32);
        self.to_writer(&mut out)?;
        Ok(out)
    }

    /// Encode into `writer`.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let duration = RawValue::from_string(format!("{:.6}", self.duration))
            .map_err(|_| CastError::format(format!("duration {} is not a number", self.duration)))?;

        let stdout = self
            .frames
            .iter()
            .map(|frame| {
                RawValue::from_string(frame.to_json()).map_err(|_| {
                    CastError::format(format!("frame delay {} is not a number", frame.delay))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let wire = WireDocument {
            version: self.version,
            width: self.width,
            height: self.height,
            duration,
            command: &self.command,
            title: &self.title,
            env: &self.env,
            stdout,
        };
        serde_json::to_writer_pretty(writer, &wire)?;
        Ok(())
    }

    /// Decode a document.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let wire: RawDocument = serde_json::from_slice(bytes)?;
        Self::from_wire(wire)
    }

    /// Decode a document read to the end from `reader`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let wire: RawDocument = serde_json::from_reader(reader)?;
        Self::from_wire(wire)
    }

    fn from_wire(wire: RawDocument) -> Result<Self> {
        if wire.version != u64::from(VERSION) {
            return Err(CastError::format(format!(
                "unsupported asciicast version {}",
                wire.version
            )));
        }

        let frames = wire
            .stdout
            .iter()
            .enumerate()
            .map(|(index, raw)| decode_frame(raw).map_err(|e| frame_error(index, &e)))
            .collect::<Result<Vec<_>>>()?;

        let duration = wire
            .duration
            .unwrap_or_else(|| frames.iter().map(|f| f.delay).sum());

        Ok(Self {
            version: VERSION,
            width: wire.width,
            height: wire.height,
            duration,
            command: wire.command,
            title: wire.title,
            env: wire.env,
            frames,
        })
    }
}

#[derive(Serialize)]
struct WireDocument<'a> {
    version: u32,
    width: u16,
    height: u16,
    duration: Box<RawValue>,
    command: &'a str,
    title: &'a str,
    env: &'a Env,
    stdout: Vec<Box<RawValue>>,
}

#[derive(Deserialize)]
struct RawDocument {
    version: u64,
    width: u16,
    height: u16,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    command: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    env: Env,
    #[serde(default)]
    stdout: Vec<Box<RawValue>>,
}

fn decode_frame(raw: &RawValue) -> Result<Frame> {
    let (delay, text): (f64, Box<RawValue>) = serde_json::from_str(raw.get())?;
    if !(delay.is_finite() && delay >= 0.0) {
        return Err(CastError::format(format!("negative delay {delay}")));
    }
    let data = unescape_literal(text.get())?;
    Ok(Frame { delay, data })
}

fn frame_error(index: usize, err: &CastError) -> CastError {
    match err {
        CastError::Format { message } => CastError::format(format!("frame {index}: {message}")),
        other => CastError::format(format!("frame {index}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Asciicast {
        Asciicast::new(
            80,
            24,
            vec![
                Frame::new(0.000_005, b"hello".to_vec()),
                Frame::new(0.01, b"world".to_vec()),
            ],
        )
        .with_command("/bin/bash")
        .with_env(Env::new("xterm-256color", "/bin/bash"))
    }

    #[test]
    fn duration_is_sum_of_delays() {
        let cast = sample();
        assert!((cast.duration - 0.010_005).abs() < 1e-12);
        assert_eq!(cast.version, VERSION);
    }

    #[test]
    fn encoding_layout() {
        let text = String::from_utf8(sample().encode().unwrap()).unwrap();
        let expected = r#"{
  "version": 1,
  "width": 80,
  "height": 24,
  "duration": 0.010005,
  "command": "/bin/bash",
  "title": "",
  "env": {
    "TERM": "xterm-256color",
    "SHELL": "/bin/bash"
  },
  "stdout": [
    [0.000005, "hello"],
    [0.010000, "world"]
  ]
}"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn decode_reads_back_encoding() {
        let cast = sample();
        let decoded = Asciicast::decode(&cast.encode().unwrap()).unwrap();
        assert_eq!(decoded.frames, cast.frames);
        assert_eq!(decoded.env, cast.env);
        assert_eq!(decoded.command, "/bin/bash");
        assert_eq!((decoded.width, decoded.height), (80, 24));
    }

    #[test]
    fn decode_accepts_minimal_documents() {
        let doc = br#"{"version": 1, "width": 10, "height": 5, "stdout": [[0.5, "a"], [1.5, "\u001b[0m"]]}"#;
        let cast = Asciicast::decode(doc).unwrap();
        assert!((cast.duration - 2.0).abs() < 1e-12);
        assert_eq!(cast.frames[1].data, b"\x1b[0m");
        assert_eq!(cast.env, Env::default());
        assert!(cast.title.is_empty());
    }

    #[test]
    fn decode_rejects_other_versions() {
        let doc = br#"{"version": 2, "width": 10, "height": 5, "stdout": []}"#;
        let err = Asciicast::decode(doc).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("version 2"));
    }

    #[test]
    fn decode_rejects_malformed_frames() {
        let cases: [&[u8]; 4] = [
            br#"{"version": 1, "width": 1, "height": 1, "stdout": [[0.1]]}"#,
            br#"{"version": 1, "width": 1, "height": 1, "stdout": [[0.1, "a", 3]]}"#,
            br#"{"version": 1, "width": 1, "height": 1, "stdout": [["0.1", "a"]]}"#,
            br#"{"version": 1, "width": 1, "height": 1, "stdout": [[0.1, 42]]}"#,
        ];
        for doc in cases {
            let err = Asciicast::decode(doc).unwrap_err();
            assert!(err.is_format(), "{err}");
            assert!(err.to_string().contains("frame 0"), "{err}");
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Asciicast::decode(b"not json").unwrap_err().is_format());
        assert!(Asciicast::decode(b"{\"version\": 1}").unwrap_err().is_format());
    }

    #[test]
    fn encode_rejects_non_finite_delays() {
        let cast = Asciicast::new(1, 1, vec![Frame::new(f64::NAN, b"x".to_vec())]);
        assert!(cast.encode().unwrap_err().is_format());
    }

    #[test]
    fn binary_frames_survive() {
        let data: Vec<u8> = (0..=255).collect();
        let cast = Asciicast::new(1, 1, vec![Frame::new(0.25, data.clone())]);
        let decoded = Asciicast::decode(&cast.encode().unwrap()).unwrap();
        assert_eq!(decoded.frames[0].data, data);
    }
}
