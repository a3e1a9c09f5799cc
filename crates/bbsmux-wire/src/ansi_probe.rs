// SPDX-License-Identifier: MIT

//! ANSI escape sequences used to probe a non-telnet peer for its terminal
//! dimensions, and the small hand-rolled parsers for their responses.
//!
//! These are not telnet framing (no `IAC` involved), so they live
//! alongside the negotiator rather than in [`crate::parser`].

pub const ESC: u8 = 0x1b;

/// `ESC [ 6 n` — device status report, cursor position.
pub const DSR_CURSOR_POSITION: &[u8] = b"\x1b[6n";

/// `ESC [ 18 t` — report text area size in characters.
pub const DSR_18T: &[u8] = b"\x1b[18t";

/// `ESC [ s` `ESC [ 999;999 H` `ESC [ 6n` `ESC [ u` — push the cursor to an
/// extreme corner (clamped by the terminal to its real size), ask where it
/// landed, then restore it. Used when a peer doesn't answer DSR-18t.
pub const CURSOR_EXTREME_PROBE: &[u8] = b"\x1b[s\x1b[999;999H\x1b[6n\x1b[u";

/// Does this buffer contain `ESC [`, the ANSI CSI introducer? Used to
/// classify a peer as raw-ANSI when it reacts to the cursor-position probe.
pub fn contains_csi(buf: &[u8]) -> bool {
    buf.windows(2).any(|w| w == [ESC, b'['])
}

/// Parse a cursor-position report: `ESC [ rows ; cols R`.
pub fn parse_cursor_position(buf: &[u8]) -> Option<(u16, u16)> {
    let body = csi_body(buf, b'R')?;
    let (rows, cols) = split_two(body, b';')?;
    Some((cols, rows))
}

/// Parse a DSR-18t text-area-size report: `ESC [ 8 ; rows ; cols t`.
pub fn parse_dsr_18t(buf: &[u8]) -> Option<(u16, u16)> {
    let body = csi_body(buf, b't')?;
    let mut parts = body.split(|&b| b == b';');
    let tag = parts.next()?;
    if tag != b"8" {
        return None;
    }
    let rows: u16 = std::str::from_utf8(parts.next()?).ok()?.parse().ok()?;
    let cols: u16 = std::str::from_utf8(parts.next()?).ok()?.parse().ok()?;
    Some((cols, rows))
}

/// Find `ESC [ <body> <terminator>` in `buf` and return `<body>`.
fn csi_body(buf: &[u8], terminator: u8) -> Option<&[u8]> {
    let start = buf.windows(2).position(|w| w == [ESC, b'['])? + 2;
    let rest = &buf[start..];
    let end = rest.iter().position(|&b| b == terminator)?;
    Some(&rest[..end])
}

fn split_two(body: &[u8], sep: u8) -> Option<(u16, u16)> {
    let idx = body.iter().position(|&b| b == sep)?;
    let (a, b) = (&body[..idx], &body[idx + 1..]);
    let a: u16 = std::str::from_utf8(a).ok()?.parse().ok()?;
    let b: u16 = std::str::from_utf8(b).ok()?.parse().ok()?;
    Some((a, b))
}

#[cfg(test)]
#[path = "ansi_probe_tests.rs"]
mod tests;
