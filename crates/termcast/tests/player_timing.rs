//! Integration tests for playback timing.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use termcast::{Asciicast, Frame, PlayConfig, Player};

/// Records when each write happened.
struct Timestamped {
    writes: Vec<(Instant, Vec<u8>)>,
}

impl Write for Timestamped {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.push((Instant::now(), buf.to_vec()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn hello_world(delay: f64) -> Asciicast {
    Asciicast::new(
        80,
        24,
        vec![
            Frame::new(0.0, b"hello".to_vec()),
            Frame::new(delay, b"world".to_vec()),
        ],
    )
}

#[test]
fn frames_are_spaced_by_their_delay() {
    let player = Player::new(PlayConfig::new()).unwrap();
    let mut out = Timestamped { writes: Vec::new() };
    player.play(&hello_world(0.01), &mut out).unwrap();

    assert_eq!(out.writes.len(), 2);
    assert_eq!(out.writes[0].1, b"hello");
    assert_eq!(out.writes[1].1, b"world");
    let gap = out.writes[1].0.duration_since(out.writes[0].0);
    assert!(gap >= Duration::from_millis(9), "gap was {gap:?}");
}

#[test]
fn speed_shortens_pauses() {
    let player = Player::new(PlayConfig::new().speed(10.0)).unwrap();
    let start = Instant::now();
    player.play(&hello_world(1.0), &mut io::sink()).unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(90), "took {elapsed:?}");
    assert!(elapsed < Duration::from_millis(900), "took {elapsed:?}");
}

#[test]
fn empty_document_plays_nothing() {
    let player = Player::new(PlayConfig::new()).unwrap();
    let mut out = Vec::new();
    player.play(&Asciicast::new(80, 24, Vec::new()), &mut out).unwrap();
    assert!(out.is_empty());
}
