//! Integration tests for the asciicast codec.

use proptest::prelude::*;
use termcast::asciicast::frame::escape_bytes;
use termcast::{Asciicast, CastError, Env, Frame};

fn document(frames: Vec<Frame>) -> Asciicast {
    Asciicast::new(80, 24, frames)
        .with_command("/bin/sh")
        .with_title("demo")
        .with_env(Env::new("xterm-256color", "/bin/zsh"))
}

proptest! {
    /// Arbitrary output bytes survive a save/load cycle.
    #[test]
    fn bytes_survive_round_trip(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..16),
        delay in 0.0f64..1000.0,
    ) {
        let frames: Vec<Frame> = chunks.iter().map(|c| Frame::new(delay, c.clone())).collect();
        let cast = document(frames);
        let decoded = Asciicast::decode(&cast.encode().unwrap()).unwrap();

        prop_assert_eq!(decoded.frames.len(), chunks.len());
        let expected: f64 = format!("{delay:.6}").parse().unwrap();
        for (frame, chunk) in decoded.frames.iter().zip(&chunks) {
            prop_assert_eq!(&frame.data, chunk);
            prop_assert!((frame.delay - expected).abs() < 1e-9);
        }
    }

    /// Valid UTF-8 text is stored as readable text, not escaped bytes.
    #[test]
    fn printable_text_is_not_escaped(text in "[a-zA-Z0-9 äöü€😀]{0,40}") {
        let literal = escape_bytes(text.as_bytes());
        prop_assert_eq!(literal, format!("\"{text}\""));
    }
}

#[test]
fn header_fields_survive() {
    let cast = document(vec![Frame::new(0.5, b"x".to_vec())]);
    let decoded = Asciicast::decode(&cast.encode().unwrap()).unwrap();
    assert_eq!(decoded.version, 1);
    assert_eq!((decoded.width, decoded.height), (80, 24));
    assert_eq!(decoded.command, "/bin/sh");
    assert_eq!(decoded.title, "demo");
    assert_eq!(decoded.env, Env::new("xterm-256color", "/bin/zsh"));
    assert!((decoded.duration - 0.5).abs() < 1e-9);
}

#[test]
fn control_characters_use_unicode_escapes() {
    assert_eq!(escape_bytes(b"\x07"), r#""\u0007""#);
    assert_eq!(escape_bytes(b"\x0b"), r#""\u000b""#);
    assert_eq!(escape_bytes(b"\x1b[0m"), r#""\u001b[0m""#);
    assert_eq!(escape_bytes(b"a\r\nb"), r#""a\r\nb""#);
}

#[test]
fn html_and_separator_characters_use_unicode_escapes() {
    assert_eq!(escape_bytes(b"<b>&"), r#""\u003cb\u003e\u0026""#);
    assert_eq!(escape_bytes("\u{2028}\u{ad}".as_bytes()), r#""\u2028\u00ad""#);
}

#[test]
fn invalid_utf8_uses_surrogate_escapes() {
    assert_eq!(escape_bytes(b"\xff"), r#""\udcff""#);
    assert_eq!(escape_bytes(b"a\x80b"), r#""a\udc80b""#);
}

#[test]
fn malformed_frame_is_a_format_error() {
    let doc = br#"{"version": 1, "width": 80, "height": 24, "stdout": [[0.1, "a", 1]]}"#;
    let err = Asciicast::decode(doc).unwrap_err();
    assert!(matches!(err, CastError::Format { .. }), "{err}");
}

#[test]
fn truncated_document_is_a_format_error() {
    let cast = document(vec![Frame::new(0.1, b"hello".to_vec())]);
    let encoded = cast.encode().unwrap();
    let err = Asciicast::decode(&encoded[..encoded.len() / 2]).unwrap_err();
    assert!(err.is_format(), "{err}");
}
