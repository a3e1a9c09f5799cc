// SPDX-License-Identifier: MIT

//! Events produced by [`crate::parser::Parser`] as it consumes a telnet
//! byte stream.

/// One decoded unit from the stream: either a negotiation command, a
/// completed subnegotiation, or a run of plain (non-IAC) data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegEvent {
    Will(u8),
    Wont(u8),
    Do(u8),
    Dont(u8),
    /// A fully framed `IAC SB <opt> ... IAC SE` subnegotiation, payload
    /// excluding the option byte and the `IAC SE` terminator.
    Sb { option: u8, payload: Vec<u8> },
    /// Plain data bytes (with any literal `IAC IAC` already collapsed to
    /// a single `0xff`).
    Data(Vec<u8>),
}

/// A parsed NAWS subnegotiation payload: two big-endian u16s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NawsSize {
    pub width: u16,
    pub height: u16,
}

pub fn parse_naws(payload: &[u8]) -> Option<NawsSize> {
    if payload.len() < 4 {
        return None;
    }
    let width = u16::from_be_bytes([payload[0], payload[1]]);
    let height = u16::from_be_bytes([payload[2], payload[3]]);
    Some(NawsSize { width, height })
}

/// A parsed TTYPE `IS <name>` subnegotiation payload.
pub fn parse_ttype_is(payload: &[u8]) -> Option<String> {
    let (tag, name) = payload.split_first()?;
    if *tag != crate::iac::TTYPE_IS {
        return None;
    }
    Some(String::from_utf8_lossy(name).into_owned())
}

#[cfg(test)]
#[path = "neg_event_tests.rs"]
mod tests;
