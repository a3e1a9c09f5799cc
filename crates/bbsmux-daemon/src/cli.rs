// SPDX-License-Identifier: MIT

//! Command-line flags, exactly as spec §6 specifies.

use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 2323;
pub const DEFAULT_NODES: usize = 4;

#[derive(Debug, Parser)]
#[command(name = "bbsmuxd", about = "Multi-node telnet supervisor and bridge")]
pub struct Cli {
    /// TCP listen port.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Number of nodes to start (clamped to [1, 32]).
    #[arg(short = 'n', long = "nodes", default_value_t = DEFAULT_NODES)]
    pub nodes: usize,

    /// Base directory; chdir'd into before spawning and resolved to absolute.
    #[arg(short = 'd', long = "base-dir")]
    pub base_dir: Option<PathBuf>,

    /// Engine executable path.
    #[arg(short = 'm', long = "engine")]
    pub engine_path: Option<PathBuf>,

    /// Engine config path (may be relative to base).
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<PathBuf>,

    /// Request a terminal resize to COLSxROWS before UI init.
    #[arg(short = 's', long = "size", value_name = "CxR")]
    pub size: Option<String>,

    /// Headless: run with no TUI.
    #[arg(short = 'H', long = "headless")]
    pub headless: bool,

    /// Daemonize (implies headless).
    #[arg(short = 'D', long = "daemon")]
    pub daemonize: bool,

    /// Hidden re-exec entrypoint for the Bridge (spec §4.7): when present,
    /// `bbsmuxd` skips straight to `bridge::run_child` instead of starting
    /// the supervisor. The accepted caller socket is inherited as fd 0.
    /// Never set by an operator directly; see `bridge::spawn_bridge`.
    #[arg(long = "bridge-node", hide = true)]
    pub bridge_node: Option<u8>,

    #[arg(long = "bridge-uds", hide = true)]
    pub bridge_uds: Option<PathBuf>,

    #[arg(long = "bridge-termcap", hide = true)]
    pub bridge_termcap: Option<PathBuf>,
}

/// A parsed `-s CxR` size request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRequest {
    pub cols: u16,
    pub rows: u16,
}

pub fn parse_size(text: &str) -> Option<SizeRequest> {
    let (cols, rows) = text.split_once(['x', 'X'])?;
    Some(SizeRequest { cols: cols.trim().parse().ok()?, rows: rows.trim().parse().ok()? })
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
