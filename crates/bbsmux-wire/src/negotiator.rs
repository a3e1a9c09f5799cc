// SPDX-License-Identifier: MIT

//! Terminal capability detection, run by the Bridge before it connects to
//! the engine's UDS rendezvous point.
//!
//! Implements the sequence: probe for telnet with `IAC DO SGA`, fall back
//! to an ANSI cursor-position probe, negotiate ECHO/SGA/TTYPE/NAWS for
//! telnet peers, and fall back further to DSR-18t / the cursor-extreme
//! trick when NAWS never arrives. All probe windows are drained before
//! returning so the Bridge's byte pump never sees negotiation leftovers.

use crate::ansi_probe::{self, CURSOR_EXTREME_PROBE, DSR_18T, DSR_CURSOR_POSITION};
use crate::error::WireError;
use crate::iac::{self, IAC, PROBE_DO_SGA};
use crate::neg_event::{parse_naws, parse_ttype_is, NegEvent};
use crate::parser::Parser;
use bbsmux_core::caps::TerminalCaps;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{self, Instant};

/// Floor of the initial telnet probe drain (spec §4.6 step 2).
const PROBE_FLOOR: Duration = Duration::from_millis(150);
/// Trailing idle padding added to the probe drain.
const PROBE_IDLE: Duration = Duration::from_millis(50);
/// Window to wait for an ANSI DSR cursor-position reply.
const ANSI_PROBE_WINDOW: Duration = Duration::from_millis(200);
/// Window to wait for telnet option/subnegotiation replies after the
/// post-detection negotiation burst.
const TELNET_NEGOTIATION_WINDOW: Duration = Duration::from_millis(200);
/// Window for each of the DSR-18t / cursor-extreme size fallback probes.
const DIMENSION_FALLBACK_WINDOW: Duration = Duration::from_millis(200);

const BANNER: &[u8] = b"Detecting terminal...\r\n";

/// Run the full detection sequence over `io` and return the resulting
/// capability record. `io` is whatever the Bridge is pumping bytes over —
/// a `TcpStream` in production, `tokio::io::duplex` halves in tests.
pub async fn detect<S>(io: &mut S) -> Result<TerminalCaps, WireError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    io.write_all(BANNER).await?;

    io.write_all(&PROBE_DO_SGA).await?;
    let probe_reply = drain_with_idle(io, PROBE_FLOOR, PROBE_IDLE).await?;
    let telnet = probe_reply.contains(&IAC);

    if !telnet {
        return detect_ansi_only(io).await;
    }

    io.write_all(&iac::post_detection_negotiation()).await?;
    io.write_all(&iac::REQUEST_TTYPE).await?;
    let negotiated = read_for(io, TELNET_NEGOTIATION_WINDOW).await?;
    let mut parser = Parser::new();
    let events = parser.feed(&negotiated);

    let mut width = None;
    let mut height = None;
    for ev in &events {
        if let NegEvent::Sb { option, payload } = ev {
            if *option == iac::OPT_NAWS {
                if let Some(naws) = parse_naws(payload) {
                    width = Some(naws.width);
                    height = Some(naws.height);
                }
            } else if *option == iac::OPT_TTYPE {
                let _name = parse_ttype_is(payload);
            }
        }
    }

    if width.is_none() || height.is_none() {
        if let Some((w, h)) = probe_dsr_18t(io).await? {
            width = Some(w);
            height = Some(h);
        } else if let Some((w, h)) = probe_cursor_extreme(io).await? {
            width = Some(w);
            height = Some(h);
        }
    }

    let (width, height) = (width.unwrap_or(80), height.unwrap_or(24));
    Ok(TerminalCaps::new(true, true, width, height))
}

async fn detect_ansi_only<S>(io: &mut S) -> Result<TerminalCaps, WireError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    io.write_all(DSR_CURSOR_POSITION).await?;
    let reply = read_for(io, ANSI_PROBE_WINDOW).await?;

    if !ansi_probe::contains_csi(&reply) {
        return Ok(TerminalCaps::default());
    }

    let (width, height) = ansi_probe::parse_cursor_position(&reply).unwrap_or((80, 24));
    Ok(TerminalCaps::new(false, true, width, height))
}

async fn probe_dsr_18t<S>(io: &mut S) -> Result<Option<(u16, u16)>, WireError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    io.write_all(DSR_18T).await?;
    let reply = read_for(io, DIMENSION_FALLBACK_WINDOW).await?;
    Ok(ansi_probe::parse_dsr_18t(&reply))
}

async fn probe_cursor_extreme<S>(io: &mut S) -> Result<Option<(u16, u16)>, WireError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    io.write_all(CURSOR_EXTREME_PROBE).await?;
    let reply = read_for(io, DIMENSION_FALLBACK_WINDOW).await?;
    Ok(ansi_probe::parse_cursor_position(&reply))
}

/// Read whatever arrives within `window`, stopping early on EOF.
async fn read_for<S>(io: &mut S, window: Duration) -> Result<Vec<u8>, WireError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let deadline = Instant::now() + window;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        let mut chunk = [0u8; 512];
        match time::timeout(remaining, io.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => return Err(e.into()),
            Err(_elapsed) => break,
        }
    }
    Ok(buf)
}

/// Drain for at least `floor`, then keep reading as long as bytes keep
/// arriving within `idle` of each other (spec §4.6 step 2's "150 ms plus
/// 50 ms idle padding").
async fn drain_with_idle<S>(io: &mut S, floor: Duration, idle: Duration) -> Result<Vec<u8>, WireError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let floor_deadline = Instant::now() + floor;
    loop {
        let remaining_floor = floor_deadline.saturating_duration_since(Instant::now());
        let wait = if remaining_floor.is_zero() { idle } else { remaining_floor };
        let mut chunk = [0u8; 512];
        match time::timeout(wait, io.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => return Err(e.into()),
            Err(_elapsed) => {
                if remaining_floor.is_zero() {
                    break;
                }
            }
        }
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "negotiator_tests.rs"]
mod tests;
