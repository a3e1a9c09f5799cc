// SPDX-License-Identifier: MIT

//! Resolves parsed CLI flags into the absolute paths and clamped values
//! the rest of the daemon operates on.

use crate::cli::{Cli, SizeRequest};
use crate::error::DaemonError;
use bbsmux_core::table::MAX_NODES;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub node_count: usize,
    pub base_dir: PathBuf,
    pub engine_path: PathBuf,
    pub config_path: PathBuf,
    /// Sibling configuration editor, launched by the `C` operator key
    /// (§4.9). Not independently configurable by a CLI flag in the
    /// original — it always lives at `<base>/bin/maxcfg`.
    pub config_editor_path: PathBuf,
    pub initial_size: Option<SizeRequest>,
    pub headless: bool,
    pub daemonize: bool,
}

impl Config {
    pub fn resolve(cli: &Cli) -> Result<Self, DaemonError> {
        let base_dir = match &cli.base_dir {
            Some(p) => p.clone(),
            None => std::env::current_dir().map_err(|_| DaemonError::BaseDirInvalid(PathBuf::from(".")))?,
        };
        let base_dir = std::fs::canonicalize(&base_dir).map_err(|_| DaemonError::BaseDirInvalid(base_dir.clone()))?;
        if !base_dir.is_dir() {
            return Err(DaemonError::BaseDirInvalid(base_dir));
        }

        let engine_path = cli.engine_path.clone().unwrap_or_else(|| base_dir.join("bin").join("max"));
        let config_path = resolve_relative(&base_dir, cli.config_path.as_deref().unwrap_or(Path::new("etc/max.prm")));
        let config_editor_path = base_dir.join("bin").join("maxcfg");

        let initial_size = cli.size.as_deref().and_then(crate::cli::parse_size);

        Ok(Self {
            port: cli.port,
            node_count: cli.nodes.clamp(1, MAX_NODES),
            base_dir,
            engine_path,
            config_path,
            config_editor_path,
            initial_size,
            headless: cli.headless || cli.daemonize,
            daemonize: cli.daemonize,
        })
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
