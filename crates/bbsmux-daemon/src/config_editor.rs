// SPDX-License-Identifier: MIT

//! Controlling-terminal handoff to the sibling configuration editor, per
//! spec §4.9.
//!
//! The editor must inherit the real tty on fds 0/1/2 so its own curses
//! rendering works, but the monitor's own process must stop writing to
//! that tty for the duration of the handoff. That means the child has to
//! be spawned *before* the monitor's own stdout/stderr are redirected —
//! `std::process::Command` inherits the parent's current fd table at
//! spawn time, so reversing this order would hand the editor `/dev/null`
//! instead of the tty. `launch`'s two steps therefore run spawn-then-
//! redirect, even though spec.md's prose numbers them the other way
//! around (recorded in DESIGN.md).

use crate::env;
use nix::unistd::{dup, dup2};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::path::Path;
use std::process::Command;

/// Live handoff state: the editor's pid (for `ChildReaper`) and the
/// monitor's own original stdout/stderr, saved for `restore`.
pub struct ConfigEditorHandoff {
    pub pid: u32,
    saved_stdout: OwnedFd,
    saved_stderr: OwnedFd,
    stdout_fd: RawFd,
    stderr_fd: RawFd,
}

/// Launch the editor, using the real process stdout/stderr (fds 1/2).
pub fn launch(config_editor_path: &Path, base_dir: &Path, config_path: &Path) -> io::Result<ConfigEditorHandoff> {
    launch_on_fds(config_editor_path, base_dir, config_path, 1, 2)
}

/// Same as [`launch`], but operating on caller-supplied fds rather than
/// the process's real stdout/stderr — lets tests exercise the save/
/// redirect/restore sequence without touching the test harness's own
/// output.
pub fn launch_on_fds(
    config_editor_path: &Path,
    base_dir: &Path,
    config_path: &Path,
    stdout_fd: RawFd,
    stderr_fd: RawFd,
) -> io::Result<ConfigEditorHandoff> {
    let saved_stdout = dup_fd(stdout_fd)?;
    let saved_stderr = dup_fd(stderr_fd)?;

    let inherited: HashMap<String, String> = std::env::vars().collect();
    let worker_env = env::build_worker_env(base_dir, config_path, &inherited);

    let mut cmd = Command::new(config_editor_path);
    cmd.current_dir(base_dir).env_clear().envs(worker_env);
    let child = cmd.spawn()?;
    let pid = child.id();
    drop(child);

    redirect_to_dev_null(stdout_fd)?;
    redirect_to_dev_null(stderr_fd)?;

    Ok(ConfigEditorHandoff { pid, saved_stdout, saved_stderr, stdout_fd, stderr_fd })
}

/// Restore the monitor's stdout/stderr once the editor has exited, per
/// spec §4.9 step 6. Consumes the handoff; its saved fds are closed on
/// drop after the `dup2` back.
pub fn restore(handoff: ConfigEditorHandoff) -> io::Result<()> {
    dup2(handoff.saved_stdout.as_raw_fd(), handoff.stdout_fd).map_err(nix_to_io)?;
    dup2(handoff.saved_stderr.as_raw_fd(), handoff.stderr_fd).map_err(nix_to_io)?;
    Ok(())
}

fn dup_fd(fd: RawFd) -> io::Result<OwnedFd> {
    let dup_raw = dup(fd).map_err(nix_to_io)?;
    Ok(unsafe { OwnedFd::from_raw_fd(dup_raw) })
}

fn redirect_to_dev_null(target: RawFd) -> io::Result<()> {
    let dev_null = File::options().read(true).write(true).open("/dev/null")?;
    dup2(dev_null.as_raw_fd(), target).map_err(nix_to_io)?;
    Ok(())
}

fn nix_to_io(e: nix::Error) -> io::Error {
    io::Error::from_raw_os_error(e as i32)
}

#[cfg(test)]
#[path = "config_editor_tests.rs"]
mod tests;
