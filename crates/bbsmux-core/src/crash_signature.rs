// SPDX-License-Identifier: MIT

//! Bounded ring buffer of recent PTY output, and crash-signature extraction
//! from it.
//!
//! The ring is what `PtyDrainer` feeds bytes into on every non-blocking
//! read; `extract_signature` is called once, when a node transitions to
//! `FAILED`, to produce a short string for both the `last_error` display
//! and popup deduplication.

use std::borrow::Cow;

/// Default ring capacity: 1 KiB, per spec.
pub const DEFAULT_RING_CAPACITY: usize = 1024;

/// Markers the legacy engine is known to print just before dying in a way
/// that's diagnosable from the tty transcript. Exposed as data (rather
/// than hard-coded into the scan) so deployments can extend or replace it.
pub const DEFAULT_MARKERS: &[&str] =
    &["Old language", "recompile", "parse error", "Segmentation fault", "core dumped"];

/// A fixed-capacity byte ring. Pushing past capacity discards the oldest
/// bytes to make room, matching the spec's "NUL-terminated... discard the
/// oldest" contract (we use a `Vec<u8>` rather than an actual C-style
/// NUL-terminated buffer, since Rust strings carry their own length).
#[derive(Debug, Clone)]
pub struct Ring {
    capacity: usize,
    buf: Vec<u8>,
}

impl Ring {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, buf: Vec::with_capacity(capacity) }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        if bytes.len() >= self.capacity {
            // The incoming chunk alone fills (or overflows) the ring; keep
            // only its tail.
            let start = bytes.len() - self.capacity;
            self.buf.clear();
            self.buf.extend_from_slice(&bytes[start..]);
            return;
        }

        let overflow = (self.buf.len() + bytes.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.buf.drain(0..overflow);
        }
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Lossily decoded contents, as the scanner sees them.
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }
}

/// Extract a short crash signature from recent PTY output.
///
/// Scans for the first of `markers` appearing in `ring`; if none match,
/// falls back to the last non-empty trimmed line. Returns `"unknown"` if
/// the ring is empty.
pub fn extract_signature(ring: &Ring, markers: &[&str]) -> String {
    let text = ring.as_str();

    for marker in markers {
        if let Some(pos) = text.find(marker) {
            // Surface a little context: the marker plus the rest of that line.
            let line_end = text[pos..].find(['\n', '\r']).map(|i| pos + i).unwrap_or(text.len());
            return text[pos..line_end].trim().to_string();
        }
    }

    text.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "crash_signature_tests.rs"]
mod tests;
