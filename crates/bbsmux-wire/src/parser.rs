// SPDX-License-Identifier: MIT

//! Streaming telnet byte-stream parser.
//!
//! Feed it chunks as they arrive from the socket; it returns the
//! [`NegEvent`]s decoded from that chunk, carrying any partial command
//! across calls in its internal state. Plain data bytes are coalesced into
//! a single [`NegEvent::Data`] per call rather than emitted byte-by-byte.

use crate::iac::{DO, DONT, IAC, SB, SE, WILL, WONT};
use crate::neg_event::NegEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Normal,
    GotIac,
    GotCommand(u8),
    InSb { option: Option<u8>, buf: Vec<u8> },
    InSbGotIac { option: u8, buf: Vec<u8> },
}

/// Incremental decoder for one direction of a telnet connection.
#[derive(Debug)]
pub struct Parser {
    state: State,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self { state: State::Normal }
    }

    /// Decode one chunk of bytes, returning the events it produced in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<NegEvent> {
        let mut events = Vec::new();
        let mut data_run = Vec::new();

        for &b in chunk {
            match std::mem::replace(&mut self.state, State::Normal) {
                State::Normal => {
                    if b == IAC {
                        self.state = State::GotIac;
                    } else {
                        self.state = State::Normal;
                        data_run.push(b);
                    }
                }
                State::GotIac => {
                    if b == IAC {
                        // Escaped literal 0xff.
                        self.state = State::Normal;
                        data_run.push(IAC);
                    } else if matches!(b, WILL | WONT | DO | DONT) {
                        flush_data(&mut data_run, &mut events);
                        self.state = State::GotCommand(b);
                    } else if b == SB {
                        flush_data(&mut data_run, &mut events);
                        self.state = State::InSb { option: None, buf: Vec::new() };
                    } else {
                        // Unknown/unsupported command byte (e.g. NOP, AYT):
                        // drop it silently and resume.
                        self.state = State::Normal;
                    }
                }
                State::GotCommand(cmd) => {
                    self.state = State::Normal;
                    events.push(match cmd {
                        WILL => NegEvent::Will(b),
                        WONT => NegEvent::Wont(b),
                        DO => NegEvent::Do(b),
                        DONT => NegEvent::Dont(b),
                        _ => unreachable!("GotCommand only constructed for WILL/WONT/DO/DONT"),
                    });
                }
                State::InSb { option: None, mut buf } => {
                    // First byte after `IAC SB` is the option number.
                    let _ = &mut buf;
                    self.state = State::InSb { option: Some(b), buf: Vec::new() };
                }
                State::InSb { option: Some(opt), mut buf } => {
                    if b == IAC {
                        self.state = State::InSbGotIac { option: opt, buf };
                    } else {
                        buf.push(b);
                        self.state = State::InSb { option: Some(opt), buf };
                    }
                }
                State::InSbGotIac { option, mut buf } => {
                    if b == SE {
                        events.push(NegEvent::Sb { option, payload: buf });
                        self.state = State::Normal;
                    } else if b == IAC {
                        // Escaped literal 0xff inside subnegotiation payload.
                        buf.push(IAC);
                        self.state = State::InSb { option: Some(option), buf };
                    } else {
                        // Malformed: IAC inside SB not followed by SE or IAC.
                        // Treat as a fresh command start, discarding the
                        // incomplete subnegotiation.
                        if matches!(b, WILL | WONT | DO | DONT) {
                            self.state = State::GotCommand(b);
                        } else {
                            self.state = State::Normal;
                        }
                    }
                }
            }
        }

        flush_data(&mut data_run, &mut events);
        events
    }
}

fn flush_data(data_run: &mut Vec<u8>, events: &mut Vec<NegEvent>) {
    if !data_run.is_empty() {
        events.push(NegEvent::Data(std::mem::take(data_run)));
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
