// SPDX-License-Identifier: MIT

//! Operator PTY attach ("snoop"), per spec §4.10.
//!
//! The TUI already owns the controlling terminal in raw mode and reads
//! operator input as a `crossterm` event stream (see [`SPEC_FULL.md`]'s
//! concurrency section); snoop does not grab the terminal a second time.
//! Instead it is a mode the supervisor's own tick loop switches into: PTY
//! output is written straight to stdout instead of through a TUI widget,
//! and key events are translated back into the raw bytes the engine
//! expects instead of being interpreted as operator commands.
//!
//! This module is deliberately free of its own event loop — like
//! [`crate::pty_drainer`], it exposes synchronous step functions the
//! supervisor calls once per tick while a node is snooped.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::io::{self, ErrorKind, Read, Write};

/// Upper bound on bytes forwarded from the PTY to stdout in one tick,
/// mirroring [`crate::pty_drainer::drain`]'s per-tick cap.
const MAX_BYTES_PER_TICK: usize = 64 * 1024;

/// `ESC c` (RIS, reset-to-initial-state) — what F2 sends to the engine.
pub const ENGINE_RESET_SEQUENCE: &[u8] = b"\x1bc";

/// What the supervisor should do with one operator key event while a node
/// is snooped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnoopCommand {
    /// Forward these bytes to the PTY master verbatim.
    Forward(Vec<u8>),
    /// F1: end the snoop session, no bytes sent to the engine.
    Detach,
    /// F2: send [`ENGINE_RESET_SEQUENCE`] instead of the raw keystroke.
    ResetEngine,
}

/// Classify one key event during a snoop session.
pub fn handle_key(key: &KeyEvent) -> SnoopCommand {
    match key.code {
        KeyCode::F(1) => SnoopCommand::Detach,
        KeyCode::F(2) => SnoopCommand::ResetEngine,
        _ => SnoopCommand::Forward(key_to_bytes(key)),
    }
}

/// Reconstruct the raw bytes a real terminal would have sent for `key`.
/// Covers the inputs an engine expects to see; anything not named here
/// (media keys, mouse, etc.) never reaches this function because
/// `crossterm` only emits `Key` events for keyboard input.
fn key_to_bytes(key: &KeyEvent) -> Vec<u8> {
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let upper = c.to_ascii_uppercase();
            if upper.is_ascii_alphabetic() {
                vec![(upper as u8) & 0x1f]
            } else {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf).as_bytes().to_vec()
            }
        }
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        // xterm's SS3-encoded function keys only go up to F4; anything
        // past that has no single agreed-on encoding across terminals and
        // is dropped rather than guessed at.
        KeyCode::F(n) if (1..=4).contains(&n) => format!("\x1bO{}", (b'P' + n - 1) as char).into_bytes(),
        _ => Vec::new(),
    }
}

/// Copy whatever is currently available from `master` straight to
/// `stdout`, stopping at EOF, `EWOULDBLOCK`, or the per-tick byte cap.
/// Returns `true` on EOF, exactly as [`crate::pty_drainer::drain`] does.
pub fn drain_to_stdout(master: &mut std::fs::File, stdout: &mut impl Write) -> io::Result<bool> {
    let mut buf = [0u8; 4096];
    let mut total = 0;
    loop {
        if total >= MAX_BYTES_PER_TICK {
            return Ok(false);
        }
        match master.read(&mut buf) {
            Ok(0) => return Ok(true),
            Ok(n) => {
                stdout.write_all(&buf[..n])?;
                total += n;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(false),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => return Ok(true),
        }
    }
}

#[cfg(test)]
#[path = "snoop_tests.rs"]
mod tests;
