// SPDX-License-Identifier: MIT

//! `bbsmuxd`: the multi-node telnet supervisor and bridge.
//!
//! `main.rs` is intentionally thin — it parses `Cli`, handles the hidden
//! bridge-child re-exec and `-D` daemonize paths, and otherwise hands off
//! to [`supervisor::Supervisor`]. Everything else lives in its own module
//! here so it can be unit-tested without spawning a real `bbsmuxd`
//! process (the few things that can't be unit-tested this way — the
//! actual fork/exec/PTY/daemonize syscalls — are exercised by the
//! workspace-level `tests/specs.rs` instead).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bridge;
pub mod callers;
pub mod cli;
pub mod config;
pub mod config_editor;
pub mod daemonize;
pub mod env;
pub mod error;
pub mod listener;
pub mod logging;
pub mod paths;
pub mod pty_drainer;
pub mod reaper;
pub mod snoop;
pub mod spawner;
pub mod supervisor;
pub mod tui;
pub mod userinfo;

pub use config::Config;
pub use error::DaemonError;
