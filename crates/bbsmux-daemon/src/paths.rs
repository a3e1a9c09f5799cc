// SPDX-License-Identifier: MIT

//! Per-node rendezvous filesystem layout under `<base>/run/node/<ii>/`.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct NodePaths {
    pub dir: PathBuf,
    /// UDS stream socket the engine creates and the Bridge connects to.
    pub uds: PathBuf,
    /// Busy sentinel; present while the node is not free.
    pub lock: PathBuf,
    /// `TerminalCaps` text record, written by the Negotiator.
    pub termcap: PathBuf,
    /// Per-session user record, written by the engine.
    pub lastus: PathBuf,
    /// BBS-global stats snapshot (present only on nodes 0/1 in the legacy
    /// layout; we look it up on node 1 since we are 1-indexed).
    pub bbstat: PathBuf,
}

impl NodePaths {
    pub fn new(base: &Path, node_num: u8) -> Self {
        let dir = base.join("run").join("node").join(format!("{node_num:02}"));
        Self {
            uds: dir.join("maxipc"),
            lock: dir.join("maxipc.lck"),
            termcap: dir.join("termcap.dat"),
            lastus: dir.join("lastus.bbs"),
            bbstat: dir.join("bbstat.bbs"),
            dir,
        }
    }
}

/// Append-only caller log, shared across all nodes.
pub fn callers_log(base: &Path) -> PathBuf {
    base.join("run").join("callers.bbs")
}

/// Remove any stale rendezvous files left by a previous, uncleanly-exited
/// worker, per spec §4.2's "stale rendezvous files ... must be removed
/// before the child is given a chance to create them".
pub fn clear_stale(paths: &NodePaths) -> std::io::Result<()> {
    for path in [&paths.uds, &paths.lock] {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
