// SPDX-License-Identifier: MIT

//! Per-node state: the lifecycle state machine described in spec §4.1,
//! plus the bookkeeping fields needed to drive it and display it.

use crate::backoff;
use crate::crash_signature::{self, Ring, DEFAULT_RING_CAPACITY};
use crate::error::CoreError;
use std::path::PathBuf;
use std::time::Instant;

/// One of the six lifecycle states a node can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Inactive,
    Starting,
    Wfc,
    Connected,
    Stopping,
    Failed,
}

/// How a worker process ended, as reported by `waitpid`.
///
/// Deliberately not `std::process::ExitStatus` — that type can't be
/// constructed outside of an actual `wait()` call, which would make the
/// classification logic untestable without spawning real processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Process called `exit()` (or returned) with this status code.
    Exited(i32),
    /// Process was terminated by this signal number.
    Signaled(i32),
}

/// The legacy engine's "unrecoverable" sentinel exit code.
pub const CRITICAL_EXIT_CODE: i32 = 3;

impl ExitOutcome {
    /// Fatal vs. transient classification from spec §4.1: a signal, or the
    /// well-known critical exit code, is fatal; any other clean exit is
    /// transient and respawned immediately.
    pub fn is_fatal(self) -> bool {
        match self {
            ExitOutcome::Signaled(_) => true,
            ExitOutcome::Exited(code) => code == CRITICAL_EXIT_CODE,
        }
    }
}

/// Everything the supervisor tracks about one node.
#[derive(Debug, Clone)]
pub struct NodeState {
    /// 1-based, operator-visible identity. Stable for the node's lifetime.
    pub node_num: u8,
    pub status: NodeStatus,

    pub worker_pid: Option<u32>,
    pub bridge_pid: Option<u32>,
    /// PTY master file descriptor, as a plain integer so this crate stays
    /// free of any `std::os::unix` dependency — the daemon crate owns the
    /// real `OwnedFd`/`RawFd` and only mirrors the numeric value here for
    /// display and invariant-checking.
    pub pty_master: Option<i32>,

    pub uds_path: PathBuf,
    pub lock_path: PathBuf,

    pub username: Option<String>,
    pub activity: Option<String>,

    pub connect_time: Option<Instant>,
    pub start_time: Option<Instant>,

    pub exit_pending: bool,
    pub exit_status: Option<ExitOutcome>,

    pub fail_count: u32,
    pub retry_count: u32,
    pub next_retry_time: Option<Instant>,

    /// Latch preventing duplicate popups for the same failure, cleared on
    /// respawn.
    pub error_shown: bool,

    pub pty_ring: Ring,
    pub last_error: Option<String>,
}

impl NodeState {
    pub fn new(node_num: u8, uds_path: PathBuf, lock_path: PathBuf) -> Self {
        Self {
            node_num,
            status: NodeStatus::Inactive,
            worker_pid: None,
            bridge_pid: None,
            pty_master: None,
            uds_path,
            lock_path,
            username: None,
            activity: None,
            connect_time: None,
            start_time: None,
            exit_pending: false,
            exit_status: None,
            fail_count: 0,
            retry_count: 0,
            next_retry_time: None,
            error_shown: false,
            pty_ring: Ring::new(DEFAULT_RING_CAPACITY),
            last_error: None,
        }
    }

    /// Check the invariants from spec §3. Returns the first violation
    /// found, if any — intended for use in tests and debug assertions, not
    /// on the hot path.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.status == NodeStatus::Inactive
            && !(self.worker_pid.is_none() && self.bridge_pid.is_none() && self.pty_master.is_none())
        {
            return Err(format!("node {}: INACTIVE with live pids/fd", self.node_num));
        }
        if self.status == NodeStatus::Connected && self.worker_pid.is_none() {
            return Err(format!("node {}: CONNECTED with no worker_pid", self.node_num));
        }
        if self.next_retry_time.is_some() && self.status != NodeStatus::Failed {
            return Err(format!("node {}: next_retry_time set outside FAILED", self.node_num));
        }
        Ok(())
    }

    /// `INACTIVE -> STARTING` or `FAILED -> STARTING`: Spawner succeeded.
    pub fn spawn_started(&mut self, worker_pid: u32, pty_master: i32, now: Instant) {
        self.status = NodeStatus::Starting;
        self.worker_pid = Some(worker_pid);
        self.pty_master = Some(pty_master);
        self.start_time = Some(now);
        self.error_shown = false;
        self.pty_ring.clear();
        self.last_error = None;
        self.next_retry_time = None;
    }

    /// `STARTING -> WFC`: the UDS rendezvous inode was observed to exist.
    pub fn uds_appeared(&mut self) -> Result<(), CoreError> {
        self.require(NodeStatus::Starting)?;
        self.status = NodeStatus::Wfc;
        Ok(())
    }

    /// `STARTING -> INACTIVE`: worker vanished before publishing its UDS.
    pub fn demote_to_inactive(&mut self) -> Result<(), CoreError> {
        self.require(NodeStatus::Starting)?;
        self.clear_process_state();
        self.status = NodeStatus::Inactive;
        Ok(())
    }

    /// `WFC -> CONNECTED`: Listener picked this node and forked a Bridge.
    pub fn admitted(&mut self, bridge_pid: u32, peer_activity: String, now: Instant) -> Result<(), CoreError> {
        self.require(NodeStatus::Wfc)?;
        self.status = NodeStatus::Connected;
        self.bridge_pid = Some(bridge_pid);
        self.activity = Some(peer_activity);
        self.connect_time = Some(now);
        Ok(())
    }

    /// `CONNECTED -> WFC`: the Bridge exited for any reason.
    pub fn bridge_exited(&mut self) -> Result<(), CoreError> {
        self.require(NodeStatus::Connected)?;
        self.status = NodeStatus::Wfc;
        self.bridge_pid = None;
        self.username = None;
        self.activity = None;
        self.connect_time = None;
        Ok(())
    }

    /// Operator-initiated kill: any active state moves to `STOPPING`.
    pub fn operator_kill(&mut self) {
        if matches!(
            self.status,
            NodeStatus::Starting | NodeStatus::Wfc | NodeStatus::Connected | NodeStatus::Failed
        ) {
            self.status = NodeStatus::Stopping;
        }
    }

    /// `STOPPING -> INACTIVE`: reaper confirmed the worker exited cleanly
    /// after an operator kill.
    pub fn stopped_cleanly(&mut self) -> Result<(), CoreError> {
        self.require(NodeStatus::Stopping)?;
        self.clear_process_state();
        self.status = NodeStatus::Inactive;
        self.retry_count = 0;
        self.next_retry_time = None;
        Ok(())
    }

    /// Worker process exit observed by the reaper while the node was not
    /// `STOPPING`. Classifies fatal vs. transient and updates back-off
    /// bookkeeping; returns the extracted crash signature when the node
    /// enters `FAILED` for a *new* reason (popup-worthy).
    pub fn worker_exited(&mut self, outcome: ExitOutcome, markers: &[&str], now: Instant) -> Option<String> {
        self.exit_pending = true;
        self.exit_status = Some(outcome);
        self.worker_pid = None;

        if self.status == NodeStatus::Stopping {
            // Reaper will call `stopped_cleanly` separately; nothing else to do.
            return None;
        }

        if outcome.is_fatal() {
            self.fail_count += 1;
            self.retry_count += 1;
            self.status = NodeStatus::Failed;
            self.next_retry_time = backoff::next_delay(self.retry_count).map(|d| now + d);

            let signature = crash_signature::extract_signature(&self.pty_ring, markers);
            self.last_error = Some(signature.clone());
            if !self.error_shown {
                self.error_shown = true;
                return Some(signature);
            }
            None
        } else {
            // Transient/clean exit: go straight back to INACTIVE for an
            // immediate respawn, per spec §4.1.
            self.status = NodeStatus::Inactive;
            self.clear_process_state();
            None
        }
    }

    /// `FAILED -> STARTING` path precondition: has the back-off elapsed?
    pub fn retry_due(&self, now: Instant) -> bool {
        self.status == NodeStatus::Failed
            && self.next_retry_time.is_some_and(|due| now >= due)
    }

    /// Operator-issued restart: resets back-off bookkeeping so the next
    /// fatal exit starts the schedule over, per spec §4.1.
    pub fn manual_restart(&mut self) {
        self.retry_count = 0;
        self.fail_count = 0;
        self.next_retry_time = None;
        self.error_shown = false;
        if self.status != NodeStatus::Stopping {
            self.status = NodeStatus::Inactive;
            self.clear_process_state();
        }
    }

    /// Consume the reaper's `exit_pending` latch; call once per tick after
    /// the supervisor has closed the PTY / unlinked rendezvous files.
    pub fn consume_exit_pending(&mut self) -> Option<ExitOutcome> {
        if self.exit_pending {
            self.exit_pending = false;
            self.exit_status.take()
        } else {
            None
        }
    }

    fn clear_process_state(&mut self) {
        self.worker_pid = None;
        self.pty_master = None;
        self.start_time = None;
    }

    fn require(&self, expected: NodeStatus) -> Result<(), CoreError> {
        if self.status != expected {
            return Err(CoreError::InvalidTransition {
                node: self.node_num as usize,
                from: self.status,
                to: expected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
