// SPDX-License-Identifier: MIT

use super::*;
use crate::node::NodeStatus;
use std::path::Path;

#[test]
fn count_is_clamped_into_range() {
    assert_eq!(NodeTable::new(0, Path::new("/tmp/x")).len(), 1);
    assert_eq!(NodeTable::new(1000, Path::new("/tmp/x")).len(), MAX_NODES);
    assert_eq!(NodeTable::new(4, Path::new("/tmp/x")).len(), 4);
}

#[test]
fn uds_paths_are_unique_across_nodes() {
    let table = NodeTable::new(8, Path::new("/tmp/x"));
    table.check_uds_uniqueness().unwrap();
    let paths: Vec<_> = table.iter().map(|n| n.uds_path.clone()).collect();
    for i in 0..paths.len() {
        for j in 0..paths.len() {
            if i != j {
                assert_ne!(paths[i], paths[j]);
            }
        }
    }
}

#[test]
fn get_by_node_num_is_one_indexed() {
    let table = NodeTable::new(4, Path::new("/tmp/x"));
    assert_eq!(table.get(1).unwrap().node_num, 1);
    assert_eq!(table.get(4).unwrap().node_num, 4);
    assert!(table.get(5).is_err());
    assert!(table.get(0).is_err());
}

#[test]
fn first_free_picks_lowest_numbered_wfc_node_with_existing_socket() {
    let mut table = NodeTable::new(3, Path::new("/tmp/x"));
    let t0 = std::time::Instant::now();
    for n in 1..=3u8 {
        let node = table.get_mut(n).unwrap();
        node.spawn_started(n as u32, n as i32, t0);
        node.uds_appeared().unwrap();
    }

    // Only node 2's socket "exists" in this fake filesystem.
    let free = table.first_free(|p| p == table.get(2).unwrap().uds_path);
    assert_eq!(free, Some(2));
}

#[test]
fn first_free_is_none_when_no_node_is_wfc() {
    let table = NodeTable::new(2, Path::new("/tmp/x"));
    assert_eq!(table.first_free(|_| true), None);
}

#[test]
fn admission_never_double_books_a_node() {
    let mut table = NodeTable::new(1, Path::new("/tmp/x"));
    let t0 = std::time::Instant::now();
    let node = table.get_mut(1).unwrap();
    node.spawn_started(1, 1, t0);
    node.uds_appeared().unwrap();
    node.admitted(99, "peer".into(), t0).unwrap();

    assert_eq!(table.first_free(|_| true), None, "connected node must not be offered again");
    assert_eq!(table.get(1).unwrap().status, NodeStatus::Connected);
}
