// SPDX-License-Identifier: MIT

//! Forks an engine worker attached to a fresh PTY, per spec §4.2.
//!
//! Grounded in `replit-ruspty`'s `openpty` + `pre_exec` pattern from the
//! retrieval pack: `nix::pty::openpty` opens the pair, the slave end is
//! duplicated onto the child's stdio, and a `pre_exec` closure calls
//! `setsid`/`TIOCSCTTY` in the child before `exec`. We use
//! `std::process::Command` rather than `tokio::process::Command`: the
//! latter installs its own SIGCHLD-driven reaper task, which would race
//! `ChildReaper`'s own `waitpid` loop (spec §4.4 wants the supervisor to
//! own reaping exclusively).
//!
//! Unlike the original's raw `forkpty`+`execl`, `std::process::Command`
//! reports an `exec` failure synchronously as an `Err` from `spawn()`
//! (it pipes the child's errno back before the child exits) rather than
//! requiring a sentinel exit code the reaper has to recognize — so a
//! failed spawn here never creates a node in `STARTING` at all, which
//! already satisfies "failure of fork or exec leaves the node INACTIVE".

use crate::env;
use crate::paths::{self, NodePaths};
use nix::pty::{openpty, Winsize};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// `execl(max_path, "max", "-w", "-pt<N>", "-n<N>", "-b57600", "-dl", NULL)`
/// in the original — bitrate and debug-log flags are fixed, not
/// configuration the daemon exposes.
const ENGINE_BITRATE_FLAG: &str = "-b57600";
const ENGINE_DEBUG_LOG_FLAG: &str = "-dl";

/// Initial PTY size; the engine learns the caller's real dimensions from
/// `TerminalCaps` at login, not from the PTY's own winsize.
const INITIAL_COLS: u16 = 80;
const INITIAL_ROWS: u16 = 24;

/// Everything the supervisor needs to keep a freshly spawned worker
/// drained and reapable: its pid (for `waitpid`/signals) and the PTY
/// master end (for `PtyDrainer`).
pub struct SpawnedWorker {
    pub pid: u32,
    pub master: std::fs::File,
    pub start_time: Instant,
}

/// `INACTIVE -> STARTING`: clear stale rendezvous files, open a PTY, and
/// fork+exec the engine worker attached to it.
pub fn spawn_node(
    node_num: u8,
    base_dir: &Path,
    engine_path: &Path,
    config_path: &Path,
) -> std::io::Result<SpawnedWorker> {
    let node_paths = NodePaths::new(base_dir, node_num);
    std::fs::create_dir_all(&node_paths.dir)?;
    paths::clear_stale(&node_paths)?;

    let winsize = Winsize { ws_row: INITIAL_ROWS, ws_col: INITIAL_COLS, ws_xpixel: 0, ws_ypixel: 0 };
    let pty = openpty(Some(&winsize), None).map_err(nix_to_io)?;

    let inherited: std::collections::HashMap<String, String> = std::env::vars().collect();
    let worker_env = env::build_worker_env(base_dir, config_path, &inherited);

    let mut cmd = Command::new(engine_path);
    cmd.arg("-w")
        .arg(format!("-pt{node_num}"))
        .arg(format!("-n{node_num}"))
        .arg(ENGINE_BITRATE_FLAG)
        .arg(ENGINE_DEBUG_LOG_FLAG)
        .current_dir(base_dir)
        .env_clear()
        .envs(worker_env)
        .stdin(Stdio::from(pty.slave.try_clone()?))
        .stdout(Stdio::from(pty.slave.try_clone()?))
        .stderr(Stdio::from(pty.slave.try_clone()?));

    let slave_raw = pty.slave.as_raw_fd();
    // SAFETY: runs in the forked child before exec, single-threaded at
    // that point; only async-signal-safe calls are made here.
    unsafe {
        cmd.pre_exec(move || {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            if libc::ioctl(slave_raw, libc::TIOCSCTTY as _, 0) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let child = cmd.spawn()?;
    let pid = child.id();
    // `ChildReaper` owns reaping via its own `waitpid` loop; drop the
    // handle without calling `wait()` so the pid isn't double-reaped, and
    // without calling `kill()` on drop (std's `Child` does neither).
    drop(child);
    // The slave end belongs to the child now; the parent only drains the
    // master.
    drop(pty.slave);

    set_nonblocking(&pty.master)?;

    Ok(SpawnedWorker { pid, master: std::fs::File::from(pty.master), start_time: Instant::now() })
}

fn set_nonblocking(fd: &OwnedFd) -> std::io::Result<()> {
    let raw = fd.as_raw_fd();
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }
    let rc = unsafe { libc::fcntl(raw, libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

fn nix_to_io(e: nix::Error) -> std::io::Error {
    std::io::Error::from_raw_os_error(e as i32)
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
