// SPDX-License-Identifier: MIT

use super::*;
use crate::crash_signature::DEFAULT_MARKERS;
use std::path::PathBuf;

fn fresh(n: u8) -> NodeState {
    NodeState::new(n, PathBuf::from(format!("/tmp/node{n}/maxipc")), PathBuf::from(format!("/tmp/node{n}/maxipc.lck")))
}

#[test]
fn inactive_node_satisfies_invariants() {
    let node = fresh(1);
    node.check_invariants().unwrap();
}

#[test]
fn happy_path_cycle() {
    let mut node = fresh(1);
    let t0 = Instant::now();

    node.spawn_started(100, 7, t0);
    assert_eq!(node.status, NodeStatus::Starting);
    node.check_invariants().unwrap();

    node.uds_appeared().unwrap();
    assert_eq!(node.status, NodeStatus::Wfc);

    node.admitted(200, "Connected from 10.0.0.1".to_string(), t0).unwrap();
    assert_eq!(node.status, NodeStatus::Connected);
    node.check_invariants().unwrap();

    node.bridge_exited().unwrap();
    assert_eq!(node.status, NodeStatus::Wfc);
    assert!(node.bridge_pid.is_none());
    assert!(node.activity.is_none());
}

#[test]
fn starting_demotes_to_inactive_if_worker_vanishes() {
    let mut node = fresh(1);
    node.spawn_started(100, 7, Instant::now());
    node.demote_to_inactive().unwrap();
    assert_eq!(node.status, NodeStatus::Inactive);
    assert!(node.worker_pid.is_none());
    assert!(node.pty_master.is_none());
    node.check_invariants().unwrap();
}

#[test]
fn transition_from_wrong_state_is_rejected() {
    let mut node = fresh(1);
    let err = node.uds_appeared().unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));
}

#[test]
fn fatal_exit_enters_failed_with_backoff_and_signature() {
    let mut node = fresh(1);
    let t0 = Instant::now();
    node.spawn_started(100, 7, t0);
    node.pty_ring.push(b"booting\nOld language, please recompile\n");

    let sig = node.worker_exited(ExitOutcome::Signaled(9), DEFAULT_MARKERS, t0);
    assert_eq!(node.status, NodeStatus::Failed);
    assert_eq!(node.retry_count, 1);
    assert_eq!(node.fail_count, 1);
    assert!(node.next_retry_time.is_some());
    assert_eq!(sig.as_deref(), Some("Old language, please recompile"));
    assert_eq!(node.last_error.as_deref(), Some("Old language, please recompile"));
}

#[test]
fn duplicate_failure_with_same_signature_does_not_repost_popup() {
    let mut node = fresh(1);
    let t0 = Instant::now();
    node.spawn_started(100, 7, t0);

    let first = node.worker_exited(ExitOutcome::Signaled(9), DEFAULT_MARKERS, t0);
    assert!(first.is_some());

    // Simulate a respawn without clearing error_shown (operator hasn't acted).
    node.status = NodeStatus::Starting;
    let second = node.worker_exited(ExitOutcome::Signaled(9), DEFAULT_MARKERS, t0);
    assert!(second.is_none(), "popup should not repeat while error_shown is latched");
}

#[test]
fn manual_restart_clears_error_shown_latch() {
    let mut node = fresh(1);
    let t0 = Instant::now();
    node.spawn_started(100, 7, t0);
    node.worker_exited(ExitOutcome::Signaled(9), DEFAULT_MARKERS, t0);
    assert!(node.error_shown);

    node.manual_restart();
    assert!(!node.error_shown);
    assert_eq!(node.retry_count, 0);
    assert_eq!(node.status, NodeStatus::Inactive);
}

#[test]
fn transient_exit_goes_straight_to_inactive() {
    let mut node = fresh(1);
    let t0 = Instant::now();
    node.spawn_started(100, 7, t0);

    let popup = node.worker_exited(ExitOutcome::Exited(0), DEFAULT_MARKERS, t0);
    assert!(popup.is_none());
    assert_eq!(node.status, NodeStatus::Inactive);
    assert_eq!(node.retry_count, 0, "transient exits do not consume back-off budget");
}

#[test]
fn after_three_fatal_exits_no_automatic_retry() {
    let mut node = fresh(1);
    let t0 = Instant::now();

    node.spawn_started(1, 1, t0);
    node.worker_exited(ExitOutcome::Signaled(9), DEFAULT_MARKERS, t0);
    node.status = NodeStatus::Starting; // respawned by supervisor
    node.worker_exited(ExitOutcome::Signaled(9), DEFAULT_MARKERS, t0);
    node.status = NodeStatus::Starting;
    node.worker_exited(ExitOutcome::Signaled(9), DEFAULT_MARKERS, t0);

    assert_eq!(node.retry_count, 3);
    assert!(node.next_retry_time.is_none(), "after third failure, automatic retry stops");
}

#[test]
fn operator_kill_sequence_resets_node() {
    let mut node = fresh(1);
    let t0 = Instant::now();
    node.spawn_started(100, 7, t0);
    node.uds_appeared().unwrap();

    node.operator_kill();
    assert_eq!(node.status, NodeStatus::Stopping);

    node.worker_exited(ExitOutcome::Signaled(15), DEFAULT_MARKERS, t0);
    node.stopped_cleanly().unwrap();
    assert_eq!(node.status, NodeStatus::Inactive);
    assert_eq!(node.retry_count, 0, "kill does not itself advance back-off");
    node.check_invariants().unwrap();
}

#[test]
fn automatic_respawn_clears_next_retry_time() {
    let mut node = fresh(1);
    let t0 = Instant::now();
    node.spawn_started(1, 1, t0);
    node.worker_exited(ExitOutcome::Signaled(9), DEFAULT_MARKERS, t0);
    assert_eq!(node.status, NodeStatus::Failed);
    assert!(node.next_retry_time.is_some());

    node.spawn_started(2, 2, t0);
    assert_eq!(node.status, NodeStatus::Starting);
    assert!(node.next_retry_time.is_none(), "leaving FAILED must clear next_retry_time");
    node.check_invariants().unwrap();
}

#[test]
fn retry_due_respects_next_retry_time() {
    let mut node = fresh(1);
    let t0 = Instant::now();
    node.spawn_started(1, 1, t0);
    node.worker_exited(ExitOutcome::Signaled(9), DEFAULT_MARKERS, t0);

    assert!(!node.retry_due(t0));
    let due = node.next_retry_time.unwrap();
    assert!(node.retry_due(due));
}
