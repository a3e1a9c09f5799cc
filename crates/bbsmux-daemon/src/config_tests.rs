// SPDX-License-Identifier: MIT

use super::*;
use crate::cli::Cli;
use clap::Parser;

#[test]
fn node_count_is_clamped_into_range() {
    let dir = tempfile::tempdir().unwrap();
    let cli = Cli::parse_from(["bbsmuxd", "-d", dir.path().to_str().unwrap(), "-n", "999"]);
    let config = Config::resolve(&cli).unwrap();
    assert_eq!(config.node_count, MAX_NODES);
}

#[test]
fn daemonize_implies_headless() {
    let dir = tempfile::tempdir().unwrap();
    let cli = Cli::parse_from(["bbsmuxd", "-d", dir.path().to_str().unwrap(), "-D"]);
    let config = Config::resolve(&cli).unwrap();
    assert!(config.headless);
    assert!(config.daemonize);
}

#[test]
fn relative_config_path_resolves_under_base_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cli = Cli::parse_from(["bbsmuxd", "-d", dir.path().to_str().unwrap(), "-c", "etc/maxtel.cnf"]);
    let config = Config::resolve(&cli).unwrap();
    assert_eq!(config.config_path, config.base_dir.join("etc/maxtel.cnf"));
}

#[test]
fn nonexistent_base_dir_is_rejected() {
    let cli = Cli::parse_from(["bbsmuxd", "-d", "/no/such/path/hopefully"]);
    assert!(Config::resolve(&cli).is_err());
}

#[test]
fn defaults_match_the_engine_install_layout() {
    let dir = tempfile::tempdir().unwrap();
    let cli = Cli::parse_from(["bbsmuxd", "-d", dir.path().to_str().unwrap()]);
    let config = Config::resolve(&cli).unwrap();
    assert_eq!(config.engine_path, config.base_dir.join("bin/max"));
    assert_eq!(config.config_path, config.base_dir.join("etc/max.prm"));
    assert_eq!(config.config_editor_path, config.base_dir.join("bin/maxcfg"));
}
