// SPDX-License-Identifier: MIT

//! Non-blocking PTY drain, per spec §4.3.
//!
//! The engine worker's stdout/stderr are the PTY slave; if nobody reads
//! the master end the worker eventually blocks on a `write()`. The
//! supervisor calls [`drain`] on every node once per tick; it never
//! suspends, since the master fd was set `O_NONBLOCK` at spawn time
//! (see [`crate::spawner`]).

use bbsmux_core::crash_signature::Ring;
use std::io::{ErrorKind, Read};

/// Upper bound on bytes drained in one call, so a chatty worker can't make
/// a single tick's drain loop unbounded.
const MAX_BYTES_PER_TICK: usize = 64 * 1024;

/// Read whatever is currently available from `master` into `ring`,
/// stopping at EOF, `EWOULDBLOCK`, or the per-tick byte cap.
///
/// Returns `true` if EOF was observed (the worker closed its end — this
/// doesn't by itself mean the process exited; `ChildReaper` is the source
/// of truth for that).
pub fn drain(master: &mut std::fs::File, ring: &mut Ring) -> bool {
    let mut buf = [0u8; 4096];
    let mut total = 0;
    loop {
        if total >= MAX_BYTES_PER_TICK {
            return false;
        }
        match master.read(&mut buf) {
            Ok(0) => return true,
            Ok(n) => {
                ring.push(&buf[..n]);
                total += n;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => return false,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            // Other I/O errors (e.g. EIO once the slave side is fully
            // closed) are treated the same as EOF: stop draining, let the
            // reaper decide what happened to the process.
            Err(_) => return true,
        }
    }
}

#[cfg(test)]
#[path = "pty_drainer_tests.rs"]
mod tests;
