// SPDX-License-Identifier: MIT

//! `ChildReaper`, per spec §4.4: reap every ready child in a non-blocking
//! loop, classify worker exits as fatal/transient, and clear bridge
//! bookkeeping.
//!
//! Driven by the supervisor on every `SIGCHLD` *and* once per tick
//! (belt-and-braces against a signal coalescing while several children
//! exit back-to-back).

use bbsmux_core::clock::Clock;
use bbsmux_core::node::ExitOutcome;
use bbsmux_core::table::NodeTable;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapOutcome {
    /// The config-editor child (spec §4.9) returned.
    ConfigEditorExited,
    /// A node's worker process exited. `signature` is `Some` only when
    /// this is a *new* fatal failure worth a popup (spec §4.1/§4.3).
    WorkerExited { node: u8, signature: Option<String> },
    /// A node's bridge process exited; the node is back to `WFC` (or
    /// stays `STOPPING`, if an operator kill was already in flight).
    BridgeExited { node: u8 },
    /// A pid that matched none of the above — most likely already
    /// reaped, or a grandchild the engine itself spawned and orphaned
    /// onto us. Logged and otherwise ignored.
    Unrecognized { pid: u32 },
}

/// Drain every child-exit currently pending via non-blocking `waitpid`,
/// updating `table` and returning one [`ReapOutcome`] per reaped pid.
pub fn reap_all(
    table: &mut NodeTable,
    config_editor_pid: Option<u32>,
    markers: &[&str],
    clock: &dyn Clock,
) -> Vec<ReapOutcome> {
    let mut outcomes = Vec::new();

    loop {
        let status = match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(s) => s,
            Err(nix::Error::ECHILD) => break,
            Err(_) => break,
        };

        let (pid, outcome) = match status {
            WaitStatus::Exited(pid, code) => (pid.as_raw() as u32, ExitOutcome::Exited(code)),
            WaitStatus::Signaled(pid, sig, _core_dumped) => (pid.as_raw() as u32, ExitOutcome::Signaled(sig as i32)),
            // We never request WUNTRACED/WCONTINUED, so these shouldn't
            // occur; bail rather than risk spinning on an event we can't
            // consume.
            _ => break,
        };

        outcomes.push(reap_one(table, config_editor_pid, markers, clock, pid, outcome));
    }

    outcomes
}

fn reap_one(
    table: &mut NodeTable,
    config_editor_pid: Option<u32>,
    markers: &[&str],
    clock: &dyn Clock,
    pid: u32,
    outcome: ExitOutcome,
) -> ReapOutcome {
    if config_editor_pid == Some(pid) {
        return ReapOutcome::ConfigEditorExited;
    }

    if let Some(node_num) = table.iter().find(|n| n.worker_pid == Some(pid)).map(|n| n.node_num) {
        // `get_mut` cannot fail: we just found `node_num` by iterating.
        if let Ok(node) = table.get_mut(node_num) {
            let signature = node.worker_exited(outcome, markers, clock.now());
            return ReapOutcome::WorkerExited { node: node_num, signature };
        }
    }

    if let Some(node_num) = table.iter().find(|n| n.bridge_pid == Some(pid)).map(|n| n.node_num) {
        if let Ok(node) = table.get_mut(node_num) {
            if node.status == bbsmux_core::node::NodeStatus::Connected {
                let _ = node.bridge_exited();
            } else {
                // Operator kill already moved the node to STOPPING (or it
                // raced a `CONNECTED -> WFC` already handled this tick):
                // just drop the now-stale pid.
                node.bridge_pid = None;
            }
            return ReapOutcome::BridgeExited { node: node_num };
        }
    }

    ReapOutcome::Unrecognized { pid }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
