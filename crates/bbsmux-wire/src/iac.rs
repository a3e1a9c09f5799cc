// SPDX-License-Identifier: MIT

//! RFC 854 telnet command bytes and the option numbers this supervisor
//! negotiates.

pub const IAC: u8 = 0xff;
pub const DONT: u8 = 0xfe;
pub const DO: u8 = 0xfd;
pub const WONT: u8 = 0xfc;
pub const WILL: u8 = 0xfb;
pub const SB: u8 = 0xfa;
pub const SE: u8 = 0xf0;

pub const OPT_ECHO: u8 = 1;
pub const OPT_SGA: u8 = 3;
pub const OPT_TTYPE: u8 = 24;
pub const OPT_NAWS: u8 = 31;

/// TTYPE subnegotiation sub-commands.
pub const TTYPE_IS: u8 = 0;
pub const TTYPE_SEND: u8 = 1;

/// `IAC DO SGA` — the initial telnet probe (spec §4.6 step 2).
pub const PROBE_DO_SGA: [u8; 3] = [IAC, DO, OPT_SGA];

/// `IAC SB TTYPE SEND IAC SE` — request the peer's terminal type.
pub const REQUEST_TTYPE: [u8; 6] = [IAC, SB, OPT_TTYPE, TTYPE_SEND, IAC, SE];

/// Build the post-detection telnet negotiation burst: `WILL ECHO`,
/// `WILL SGA`, `DO TTYPE`, `DO NAWS`.
pub fn post_detection_negotiation() -> [u8; 12] {
    [
        IAC, WILL, OPT_ECHO, IAC, WILL, OPT_SGA, IAC, DO, OPT_TTYPE, IAC, DO, OPT_NAWS,
    ]
}

/// Escape a buffer for egress to a telnet peer: every literal `0xff` byte
/// is doubled, per RFC 854 and spec §4.7.
pub fn escape_iac(data: &[u8]) -> Vec<u8> {
    if !data.contains(&IAC) {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len() + 4);
    for &b in data {
        out.push(b);
        if b == IAC {
            out.push(IAC);
        }
    }
    out
}

#[cfg(test)]
#[path = "iac_tests.rs"]
mod tests;
