// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn node_paths_are_zero_padded_and_nested_under_run_node() {
    let paths = NodePaths::new(Path::new("/srv/bbs"), 7);
    assert_eq!(paths.uds, PathBuf::from("/srv/bbs/run/node/07/maxipc"));
    assert_eq!(paths.lock, PathBuf::from("/srv/bbs/run/node/07/maxipc.lck"));
    assert_eq!(paths.termcap, PathBuf::from("/srv/bbs/run/node/07/termcap.dat"));
}

#[test]
fn clear_stale_removes_existing_files_and_ignores_missing_ones() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = NodePaths::new(dir.path(), 1);
    std::fs::create_dir_all(&paths.dir).unwrap();
    std::fs::write(&paths.uds, b"").unwrap();
    // lock file deliberately absent.
    paths.lock = dir.path().join("run/node/01/maxipc.lck");

    clear_stale(&paths).unwrap();
    assert!(!paths.uds.exists());
}
