// SPDX-License-Identifier: MIT

//! The recent-callers log, per spec §6: `<base>/run/callers.bbs` is an
//! append-only log of fixed-size caller records; the sidebar shows the
//! last ≤10 whose flag word has bit `0x8000` set.
//!
//! The retrieved original source does not include the engine's
//! `struct callinfo` definition, so the exact record layout below is a
//! documented assumption (see DESIGN.md), not a derived fact: a 128-byte
//! fixed record with a 36-byte name at offset 0 and a little-endian `u16`
//! flag word in the final two bytes. `RECORD_SIZE` and `FLAG_OFFSET` are
//! both named constants specifically so a real engine's layout can be
//! dropped in without touching the read logic.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

pub const RECORD_SIZE: usize = 128;
const NAME_LEN: usize = 36;
const FLAG_OFFSET: usize = RECORD_SIZE - 2;

/// Bit in the flag word marking a record as visible in the sidebar
/// (spec §6: "displays those whose flag word has bit `0x8000` set").
pub const VISIBLE_FLAG: u16 = 0x8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerRecord {
    pub name: String,
    pub flags: u16,
}

impl CallerRecord {
    pub fn is_visible(&self) -> bool {
        self.flags & VISIBLE_FLAG != 0
    }

    fn parse(raw: &[u8; RECORD_SIZE]) -> Self {
        let name_bytes = &raw[..NAME_LEN];
        let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let name = String::from_utf8_lossy(&name_bytes[..name_end]).trim().to_string();
        let flags = u16::from_le_bytes([raw[FLAG_OFFSET], raw[FLAG_OFFSET + 1]]);
        Self { name, flags }
    }
}

/// Read up to `limit` most-recent caller records, oldest first, filtered
/// to those marked visible. A missing log (no caller has connected yet)
/// is treated as empty, not an error.
pub fn read_recent(path: &Path, limit: usize) -> io::Result<Vec<CallerRecord>> {
    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let len = file.seek(SeekFrom::End(0))?;
    let total_records = (len as usize) / RECORD_SIZE;
    let start = total_records.saturating_sub(limit);

    let mut out = Vec::with_capacity(total_records.saturating_sub(start));
    let mut raw = [0u8; RECORD_SIZE];
    for i in start..total_records {
        file.seek(SeekFrom::Start((i * RECORD_SIZE) as u64))?;
        file.read_exact(&mut raw)?;
        let record = CallerRecord::parse(&raw);
        if record.is_visible() {
            out.push(record);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "callers_tests.rs"]
mod tests;
