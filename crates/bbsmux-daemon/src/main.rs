// SPDX-License-Identifier: MIT

//! `bbsmuxd` entry point.
//!
//! Three paths fork off here, before any of the supervisor's own logic
//! runs:
//!   - `--bridge-node` (hidden): this process is a re-exec'd Bridge child
//!     (spec §4.7); hand straight to [`bbsmux_daemon::bridge::run_child`]
//!     on a minimal current-thread runtime and skip the supervisor
//!     entirely.
//!   - `-D`: daemonize *before* any tokio runtime exists — `fork()` after
//!     spawning worker threads is unsound, so this has to come first.
//!   - otherwise: resolve config, open the log, and run the supervisor on
//!     a multi-threaded runtime until it exits.

use bbsmux_daemon::cli::Cli;
use bbsmux_daemon::config::Config;
use bbsmux_daemon::error::DaemonError;
use bbsmux_daemon::supervisor::Supervisor;
use bbsmux_daemon::{bridge, daemonize, logging};
use clap::error::ErrorKind;
use clap::Parser;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return handle_parse_error(error),
    };

    if let Some(node_num) = cli.bridge_node {
        return run_bridge_child(node_num, cli);
    }

    if cli.daemonize {
        if let Err(error) = daemonize::daemonize() {
            eprintln!("bbsmuxd: {error}");
            return ExitCode::FAILURE;
        }
    }

    let config = match Config::resolve(&cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("bbsmuxd: {error}");
            return ExitCode::FAILURE;
        }
    };

    if !engine_is_runnable(&config.engine_path) {
        eprintln!("bbsmuxd: {}", DaemonError::EngineNotRunnable(config.engine_path.clone()));
        return ExitCode::FAILURE;
    }

    let _log_guard = match logging::init(&config.base_dir) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("bbsmuxd: {error}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("bbsmuxd: failed to start async runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(async move {
        let supervisor = Supervisor::new(config)?;
        supervisor.run().await
    });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "supervisor exited with an error");
            ExitCode::FAILURE
        }
    }
}

/// `-h`/`--help` deviates from clap's default (which exits 0): spec §6
/// asks for usage on stdout and exit code 1. Genuine usage errors
/// (unknown flag, bad value) keep clap's ordinary behavior — print to
/// stderr, exit 2.
fn handle_parse_error(error: clap::Error) -> ExitCode {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            print!("{error}");
            ExitCode::FAILURE
        }
        ErrorKind::DisplayVersion => {
            print!("{error}");
            ExitCode::SUCCESS
        }
        _ => error.exit(),
    }
}

/// Startup validation backing [`DaemonError::EngineNotRunnable`]: the
/// engine path must name a regular file with at least one executable bit
/// set. Checked once at startup rather than left to surface as a spawn
/// failure on every node, every tick.
fn engine_is_runnable(path: &Path) -> bool {
    std::fs::metadata(path).map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

fn run_bridge_child(node_num: u8, cli: Cli) -> ExitCode {
    let (Some(uds_path), Some(termcap_path)) = (cli.bridge_uds, cli.bridge_termcap) else {
        eprintln!("bbsmuxd: --bridge-node requires --bridge-uds and --bridge-termcap");
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("bbsmuxd: bridge runtime init failed: {error}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(bridge::run_child(node_num, uds_path, termcap_path)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("bbsmuxd: bridge child error: {error}");
            ExitCode::FAILURE
        }
    }
}
