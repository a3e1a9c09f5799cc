// SPDX-License-Identifier: MIT

//! The "current user" and "BBS stats" sidebar feeds, per spec §6.
//!
//! `lastus.bbs`'s layout is given directly by spec.md: "the supervisor
//! reads the first 36 bytes as the user's display name (plus a 21-byte
//! alias at offset 72 when alias mode is enabled)". `bbstat.bbs`'s
//! layout is not specified at all; as with [`crate::callers`]'s record
//! size, the two little-endian `u32` counters read here are a documented
//! assumption (see DESIGN.md), named so a real snapshot format can be
//! substituted without touching callers.

use std::io;
use std::path::Path;

const NAME_LEN: usize = 36;
const ALIAS_OFFSET: usize = 72;
const ALIAS_LEN: usize = 21;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub name: String,
    pub alias: Option<String>,
}

/// Read the engine-written per-session record at `lastus_path`.
///
/// Returns `Ok(None)` if the file doesn't exist yet (no caller has
/// reached login on this node), which is the common case for a freshly
/// spawned `WFC` node.
pub fn read_current_user(lastus_path: &Path, alias_mode: bool) -> io::Result<Option<CurrentUser>> {
    let bytes = match std::fs::read(lastus_path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    if bytes.len() < NAME_LEN {
        return Ok(None);
    }
    let name = trim_nul(&bytes[..NAME_LEN]);

    let alias = if alias_mode && bytes.len() >= ALIAS_OFFSET + ALIAS_LEN {
        let alias = trim_nul(&bytes[ALIAS_OFFSET..ALIAS_OFFSET + ALIAS_LEN]);
        (!alias.is_empty()).then_some(alias)
    } else {
        None
    };

    Ok(Some(CurrentUser { name, alias }))
}

fn trim_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BbsStats {
    pub total_calls: u32,
    pub calls_today: u32,
}

/// Read the BBS-global stats snapshot. Missing file (before the first
/// engine instance has run) reads as zeroed stats, not an error.
pub fn read_bbs_stats(bbstat_path: &Path) -> io::Result<BbsStats> {
    let bytes = match std::fs::read(bbstat_path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BbsStats::default()),
        Err(e) => return Err(e),
    };
    if bytes.len() < 8 {
        return Ok(BbsStats::default());
    }
    Ok(BbsStats {
        total_calls: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        calls_today: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    })
}

#[cfg(test)]
#[path = "userinfo_tests.rs"]
mod tests;
