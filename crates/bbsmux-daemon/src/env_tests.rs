// SPDX-License-Identifier: MIT

use super::*;
use std::path::PathBuf;

#[test]
fn sets_library_scripts_root_and_config_vars() {
    let inherited = HashMap::new();
    let env = build_worker_env(Path::new("/srv/bbs"), &PathBuf::from("/srv/bbs/maxtel.cnf"), &inherited);

    assert_eq!(env.get(LIBRARY_PATH_VAR).unwrap(), "/srv/bbs/bin/lib");
    assert_eq!(env.get(SCRIPT_INCLUDE_VAR).unwrap(), "/srv/bbs/scripts/include");
    assert_eq!(env.get(INSTALL_ROOT_VAR).unwrap(), "/srv/bbs");
    assert_eq!(env.get(CONFIG_PATH_VAR).unwrap(), "/srv/bbs/maxtel.cnf");
}

#[test]
fn defaults_shell_only_when_unset() {
    let inherited = HashMap::new();
    let env = build_worker_env(Path::new("/srv/bbs"), Path::new("/srv/bbs/maxtel.cnf"), &inherited);
    assert_eq!(env.get("SHELL").unwrap(), DEFAULT_SHELL);
}

#[test]
fn does_not_clobber_caller_provided_shell() {
    let mut inherited = HashMap::new();
    inherited.insert("SHELL".to_string(), "/bin/zsh".to_string());
    let env = build_worker_env(Path::new("/srv/bbs"), Path::new("/srv/bbs/maxtel.cnf"), &inherited);
    assert_eq!(env.get("SHELL").unwrap(), "/bin/zsh");
}
