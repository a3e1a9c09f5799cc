// SPDX-License-Identifier: MIT

//! The `TerminalCaps` record: the small text file the Negotiator writes
//! per connection so the engine can learn the caller's terminal
//! capabilities without redoing telnet negotiation itself.

use crate::error::CoreError;
use std::fmt;

/// Width/height are clamped to this range before being written, per spec.
pub const DIM_MIN: u16 = 1;
pub const DIM_MAX: u16 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCaps {
    pub telnet: bool,
    pub ansi: bool,
    /// RIPscrip graphics support. The supervisor never detects this itself
    /// (no RIP probe in the negotiation sequence); it is always written as
    /// `false` but kept as a field because the engine's record format
    /// expects the line.
    pub rip: bool,
    pub width: u16,
    pub height: u16,
}

impl Default for TerminalCaps {
    /// Raw fallback: no telnet, no ANSI, 80x24 — per spec §4.6 step 7.
    fn default() -> Self {
        Self { telnet: false, ansi: false, rip: false, width: 80, height: 24 }
    }
}

impl TerminalCaps {
    pub fn new(telnet: bool, ansi: bool, width: u16, height: u16) -> Self {
        Self {
            telnet,
            ansi,
            rip: false,
            width: width.clamp(DIM_MIN, DIM_MAX),
            height: height.clamp(DIM_MIN, DIM_MAX),
        }
    }

    /// Render the on-disk text record understood by the engine.
    pub fn to_record(self) -> String {
        format!(
            "Telnet: {}\nAnsi: {}\nRip: {}\nWidth: {}\nHeight: {}\n",
            self.telnet as u8, self.ansi as u8, self.rip as u8, self.width, self.height
        )
    }

    /// Parse a previously-written record back into a `TerminalCaps`.
    ///
    /// Used by tests and by the operator TUI when redisplaying a node's
    /// last-known caps; the daemon's own write path never needs to parse
    /// its own output.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let mut telnet = None;
        let mut ansi = None;
        let mut rip = None;
        let mut width = None;
        let mut height = None;

        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else { continue };
            let value = value.trim();
            match key.trim() {
                "Telnet" => telnet = Some(parse_bool(value)?),
                "Ansi" => ansi = Some(parse_bool(value)?),
                "Rip" => rip = Some(parse_bool(value)?),
                "Width" => width = Some(parse_dim(value)?),
                "Height" => height = Some(parse_dim(value)?),
                _ => {}
            }
        }

        Ok(Self {
            telnet: telnet.ok_or_else(|| CoreError::MalformedCaps("missing Telnet".into()))?,
            ansi: ansi.ok_or_else(|| CoreError::MalformedCaps("missing Ansi".into()))?,
            rip: rip.unwrap_or(false),
            width: width.ok_or_else(|| CoreError::MalformedCaps("missing Width".into()))?,
            height: height.ok_or_else(|| CoreError::MalformedCaps("missing Height".into()))?,
        })
    }
}

impl fmt::Display for TerminalCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match (self.telnet, self.ansi) {
            (true, true) => "Telnet+ANSI",
            (true, false) => "Telnet",
            (false, true) => "ANSI",
            (false, false) => "Raw",
        };
        write!(f, "{kind} {}x{}", self.width, self.height)
    }
}

fn parse_bool(s: &str) -> Result<bool, CoreError> {
    match s {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(CoreError::MalformedCaps(format!("expected 0/1, got {other:?}"))),
    }
}

fn parse_dim(s: &str) -> Result<u16, CoreError> {
    let n: u16 = s.parse().map_err(|_| CoreError::MalformedCaps(format!("bad dimension {s:?}")))?;
    if n < DIM_MIN || n > DIM_MAX {
        return Err(CoreError::MalformedCaps(format!("dimension {n} out of range")));
    }
    Ok(n)
}

#[cfg(test)]
#[path = "caps_tests.rs"]
mod tests;
