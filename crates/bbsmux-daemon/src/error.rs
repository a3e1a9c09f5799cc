// SPDX-License-Identifier: MIT

//! Top-level daemon error type.
//!
//! `Startup` variants are fatal: `main` prints them to stderr and exits
//! non-zero. Everything else the supervisor loop is expected to recover
//! from on its own (log via `tracing::warn!`/`error!` and keep ticking),
//! so those variants never reach `main`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to bind listener on port {port}: {source}")]
    ListenerBind { port: u16, #[source] source: std::io::Error },

    #[error("base directory {0} does not exist or is not a directory")]
    BaseDirInvalid(std::path::PathBuf),

    #[error("failed to open log file {path}: {source}")]
    LogFileOpen { path: std::path::PathBuf, #[source] source: std::io::Error },

    #[error("failed to daemonize: {0}")]
    Daemonize(String),

    #[error("engine executable {0} is not runnable")]
    EngineNotRunnable(std::path::PathBuf),

    /// Per-node transient failure (spec §7): exec/fork/PTY setup did not
    /// succeed. The node stays `INACTIVE` and is retried next tick; this
    /// is logged by the supervisor, never returned from `main`.
    #[error("failed to spawn node {node}: {source}")]
    SpawnFailed { node: u8, #[source] source: std::io::Error },

    /// Per-connection failure (spec §7): the Bridge subprocess could not
    /// be launched for an admitted caller. The caller's socket is simply
    /// dropped; the node stays `WFC`.
    #[error("failed to spawn bridge for node {node}: {source}")]
    BridgeSpawnFailed { node: u8, #[source] source: std::io::Error },
}
