// SPDX-License-Identifier: MIT

//! TCP listener and admission, per spec §4.5.
//!
//! Unlike the teacher's `Listener`, which spawns a task per connection
//! (each handled independently against shared, lock-guarded state), ours
//! hands the accepted socket straight back to the Supervisor's own
//! `tokio::select!` — admission has to pick a node out of `NodeTable`,
//! which only the supervisor task ever touches (see DESIGN.md). The
//! `Listener` here is therefore just a thin `bind`/`accept` wrapper plus
//! the two admission-time actions (refuse, or launch a Bridge for the
//! winning node).

use crate::error::DaemonError;
use std::io;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

/// Exact substring spec.md's scenario S2 requires callers to see when no
/// node is free.
pub const ALL_NODES_BUSY_MESSAGE: &str = "Sorry, all nodes are busy. Please try again later.\r\n";

pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind the public port. `SO_REUSEADDR` and non-blocking mode are the
    /// default for a `tokio::net::TcpListener`; the listen backlog is the
    /// platform default, which is "modest" as spec.md requires without us
    /// hand-tuning it.
    pub async fn bind(port: u16) -> Result<Self, DaemonError> {
        let inner = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|source| DaemonError::ListenerBind { port, source })?;
        Ok(Self { inner })
    }

    /// Accept the next connection. Intended to be one arm of the
    /// supervisor's `tokio::select!`; never suspends the rest of the tick
    /// since the listener is only polled, not awaited exclusively.
    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.inner.accept().await
    }
}

/// Write the refusal message and close the socket. Spec.md's scenario S2:
/// the caller must see exactly the substring `all nodes are busy` then EOF.
pub async fn refuse(mut stream: TcpStream) {
    let _ = stream.write_all(ALL_NODES_BUSY_MESSAGE.as_bytes()).await;
    let _ = stream.shutdown().await;
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
