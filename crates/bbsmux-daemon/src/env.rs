// SPDX-License-Identifier: MIT

//! The environment an engine worker must see before `exec`, per spec §4.2.

use std::collections::HashMap;
use std::path::Path;

/// Name of the dynamic-library search path variable for the current OS.
#[cfg(target_os = "macos")]
const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(not(target_os = "macos"))]
const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

const SCRIPT_INCLUDE_VAR: &str = "MEX_INCLUDE";
const INSTALL_ROOT_VAR: &str = "MAX_INSTALL_PATH";
const CONFIG_PATH_VAR: &str = "MAXIMUS";
const DEFAULT_SHELL: &str = "/bin/sh";

/// Build the full environment for an engine worker, given the resolved
/// installation base directory and config path.
///
/// `inherited` is the set of environment variables already visible to the
/// daemon (normally `std::env::vars()`); passed in explicitly so the
/// builder itself stays free of ambient I/O and is trivially testable.
pub fn build_worker_env(
    base_dir: &Path,
    config_path: &Path,
    inherited: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut env = inherited.clone();

    env.insert(LIBRARY_PATH_VAR.to_string(), base_dir.join("bin").join("lib").display().to_string());
    env.insert(SCRIPT_INCLUDE_VAR.to_string(), base_dir.join("scripts").join("include").display().to_string());
    env.insert(INSTALL_ROOT_VAR.to_string(), base_dir.display().to_string());
    env.insert(CONFIG_PATH_VAR.to_string(), config_path.display().to_string());

    // `setenv(..., 0)` semantics in the original: don't clobber a
    // caller-provided SHELL.
    env.entry("SHELL".to_string()).or_insert_with(|| DEFAULT_SHELL.to_string());

    env
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
