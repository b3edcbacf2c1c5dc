//! Frames and their string encoding.
//!
//! A frame's payload is arbitrary bytes. It is written as a JSON string
//! literal, char by char. Printable text passes through; `"` and `\` are
//! escaped and `\b \f \n \r \t` keep their short forms. Every other
//! control character (BEL and VT included), spaces other than U+0020, line
//! and paragraph separators, format characters, private-use characters and
//! the HTML-sensitive `&`, `<` and `>` become `\uXXXX` (a surrogate pair
//! outside the BMP). A byte that is not part of valid UTF-8 is written as the
//! lone low surrogate `\udcXX`, which [`unescape_literal`] turns back into
//! that byte.

use std::fmt::Write as _;

use crate::error::{CastError, Result};

/// Offset used to smuggle non-UTF-8 bytes through lone surrogate escapes.
const RAW_BYTE_BASE: u32 = 0xdc00;

/// One timestamped chunk of terminal output.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Seconds since the previous frame (or since the start, for the first).
    pub delay: f64,
    /// Bytes written by the program, verbatim.
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a frame.
    #[must_use]
    pub fn new(delay: f64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            delay,
            data: data.into(),
        }
    }

    /// Render as `[delay, "text"]` with a six-decimal delay.
    #[must_use]
    pub fn to_json(&self) -> String {
        let text = escape_bytes(&self.data);
        let mut out = String::with_capacity(text.len() + 16);
        let _ = write!(out, "[{:.6}, {text}]", self.delay);
        out
    }
}

/// Escape `data` as a quoted JSON string literal.
#[must_use]
pub fn escape_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() + 2);
    out.push('"');
    for chunk in data.utf8_chunks() {
        for ch in chunk.valid().chars() {
            push_escaped_char(&mut out, ch);
        }
        for &byte in chunk.invalid() {
            let _ = write!(out, "\\u{:04x}", RAW_BYTE_BASE + u32::from(byte));
        }
    }
    out.push('"');
    out
}

fn push_escaped_char(out: &mut String, ch: char) {
    match ch {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\u{08}' => out.push_str("\\b"),
        '\u{0c}' => out.push_str("\\f"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '&' | '<' | '>' => push_unicode_escape(out, ch),
        c if !is_printable(c) => push_unicode_escape(out, c),
        c => out.push(c),
    }
}

fn push_unicode_escape(out: &mut String, ch: char) {
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
        let _ = write!(out, "\\u{unit:04x}");
    }
}

/// Whether `ch` is written literally: not a control, the only space is
/// U+0020, and neither a format nor a private-use character.
fn is_printable(ch: char) -> bool {
    !(ch.is_control()
        || (ch.is_whitespace() && ch != ' ')
        || is_format(ch)
        || is_private_use(ch))
}

/// Unicode general category Cf.
const fn is_format(ch: char) -> bool {
    matches!(
        ch,
        '\u{ad}'
            | '\u{600}'..='\u{605}'
            | '\u{61c}'
            | '\u{6dd}'
            | '\u{70f}'
            | '\u{890}'..='\u{891}'
            | '\u{8e2}'
            | '\u{180e}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206f}'
            | '\u{feff}'
            | '\u{fff9}'..='\u{fffb}'
            | '\u{110bd}'
            | '\u{110cd}'
            | '\u{13430}'..='\u{1343f}'
            | '\u{1bca0}'..='\u{1bca3}'
            | '\u{1d173}'..='\u{1d17a}'
            | '\u{e0001}'
            | '\u{e0020}'..='\u{e007f}'
    )
}

/// Unicode general category Co.
const fn is_private_use(ch: char) -> bool {
    matches!(
        ch,
        '\u{e000}'..='\u{f8ff}' | '\u{f0000}'..='\u{ffffd}' | '\u{100000}'..='\u{10fffd}'
    )
}

/// Decode a quoted JSON string literal back into bytes.
///
/// `\udc80`..`\udcff` without a preceding high surrogate yield the raw byte
/// `0x80`..`0xff`. Any other unpaired surrogate becomes U+FFFD.
pub fn unescape_literal(literal: &str) -> Result<Vec<u8>> {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| CastError::format("frame text must be a string"))?;

    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let escape = *bytes
            .get(i + 1)
            .ok_or_else(|| CastError::format("dangling escape in frame text"))?;
        i += 2;
        match escape {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'u' => {
                let unit = hex4(bytes, i)?;
                i += 4;
                i = push_code_unit(&mut out, unit, bytes, i)?;
            }
            other => {
                return Err(CastError::format(format!(
                    "invalid escape '\\{}' in frame text",
                    char::from(other)
                )));
            }
        }
    }

    Ok(out)
}

/// Push the character for UTF-16 `unit`, consuming a following low
/// surrogate escape when `unit` is a high surrogate. Returns the new index.
fn push_code_unit(out: &mut Vec<u8>, unit: u16, bytes: &[u8], i: usize) -> Result<usize> {
    let unit = u32::from(unit);
    match unit {
        0xd800..=0xdbff => {
            if bytes.get(i) == Some(&b'\\') && bytes.get(i + 1) == Some(&b'u') {
                let low = u32::from(hex4(bytes, i + 2)?);
                if (0xdc00..=0xdfff).contains(&low) {
                    let code = 0x10000 + ((unit - 0xd800) << 10) + (low - 0xdc00);
                    push_char(out, char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    return Ok(i + 6);
                }
            }
            push_char(out, char::REPLACEMENT_CHARACTER);
        }
        0xdc80..=0xdcff => out.push((unit - RAW_BYTE_BASE) as u8),
        0xdc00..=0xdfff => push_char(out, char::REPLACEMENT_CHARACTER),
        _ => push_char(out, char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER)),
    }
    Ok(i)
}

fn push_char(out: &mut Vec<u8>, ch: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
}

fn hex4(bytes: &[u8], at: usize) -> Result<u16> {
    let digits = bytes
        .get(at..at + 4)
        .filter(|d| d.iter().all(u8::is_ascii_hexdigit))
        .and_then(|d| std::str::from_utf8(d).ok())
        .ok_or_else(|| CastError::format("malformed \\u escape in frame text"))?;
    u16::from_str_radix(digits, 16)
        .map_err(|_| CastError::format(format!("invalid \\u escape '{digits}' in frame text")))
}
