// SPDX-License-Identifier: MIT

//! Plain-text log file opened at startup, per spec §7: "Log lines for
//! every state transition and every fatal classification are emitted to
//! a plain text log file opened at startup."
//!
//! `tracing-subscriber`'s `EnvFilter` additionally honors `RUST_LOG` so
//! an operator can raise verbosity without a recompile (the ambient CLI
//! addition SPEC_FULL.md calls out), and `tracing-appender` gives us a
//! non-blocking writer so a slow disk never stalls the supervisor tick.

use crate::error::DaemonError;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber, writing to `<base>/run/bbsmuxd.log`.
///
/// Returns the `WorkerGuard` for the non-blocking writer; it must be held
/// for the lifetime of the process (dropping it flushes and stops
/// accepting further writes), so `main` keeps it alive in a local binding.
pub fn init(base_dir: &Path) -> Result<WorkerGuard, DaemonError> {
    let log_dir = base_dir.join("run");
    let log_path = log_dir.join("bbsmuxd.log");
    std::fs::create_dir_all(&log_dir)
        .map_err(|source| DaemonError::LogFileOpen { path: log_path.clone(), source })?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "bbsmuxd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(guard)
}
