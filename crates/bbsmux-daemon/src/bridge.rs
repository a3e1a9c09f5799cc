// SPDX-License-Identifier: MIT

//! The Bridge, per spec §4.7: a short-lived, genuinely separate OS
//! process that runs the Negotiator, connects to a node's UDS, and pumps
//! bytes between that socket and the caller's TCP connection.
//!
//! Forking a multi-threaded tokio runtime directly is unsound (only
//! async-signal-safe calls are allowed between `fork` and `exec`/exit in
//! the child, and tokio's worker threads would simply vanish on the
//! child side). Instead — grounded in `proxmox-rs`'s `daemon.rs`
//! fork-and-re-exec pattern, and in `replit-ruspty`'s fd-juggling around
//! `pre_exec` — the Listener hands the accepted socket to
//! [`spawn_bridge`], which re-execs the current `bbsmuxd` binary with a
//! hidden `--bridge-*` flag set (see `cli.rs`). The accepted socket is
//! duplicated onto the child's stdin exactly the way [`crate::spawner`]
//! duplicates the PTY slave onto the engine worker's stdio; the child
//! reconstructs a `TcpStream` from fd 0 and runs [`run_child`], which
//! owns its own small tokio runtime.

use bbsmux_core::caps::TerminalCaps;
use bbsmux_wire::iac;
use bbsmux_wire::parser::Parser;
use std::io;
use std::os::fd::{FromRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};

/// `INACTIVE -> CONNECTED` support: fork the Bridge for an admitted
/// caller. Returns the child's pid for `NodeState::admitted`/`ChildReaper`.
pub fn spawn_bridge(
    current_exe: &Path,
    node_num: u8,
    uds_path: &Path,
    termcap_path: &Path,
    socket: TcpStream,
) -> io::Result<u32> {
    let std_socket = socket.into_std()?;

    let mut cmd = Command::new(current_exe);
    cmd.arg("--bridge-node")
        .arg(node_num.to_string())
        .arg("--bridge-uds")
        .arg(uds_path)
        .arg("--bridge-termcap")
        .arg(termcap_path)
        .stdin(Stdio::from(std_socket))
        .stdout(Stdio::null());

    let child = cmd.spawn()?;
    let pid = child.id();
    // As with the engine worker, `ChildReaper` owns reaping.
    drop(child);
    Ok(pid)
}

/// Entry point run by the re-exec'd child process when invoked with
/// `--bridge-node`. Negotiates terminal caps, connects to the node's
/// UDS, and pumps bytes until either side closes.
pub async fn run_child(node_num: u8, uds_path: PathBuf, termcap_path: PathBuf) -> io::Result<()> {
    let _ = node_num;
    let mut tcp = reconstruct_stdin_socket()?;

    let caps = bbsmux_wire::detect(&mut tcp).await.unwrap_or_default();
    write_termcap(&termcap_path, caps)?;

    let uds = UnixStream::connect(&uds_path).await?;
    pump(tcp, uds, caps.telnet).await
}

/// fd 0 is the caller's socket, handed down by `spawn_bridge` via
/// `Stdio::from`.
fn reconstruct_stdin_socket() -> io::Result<TcpStream> {
    // SAFETY: fd 0 is exclusively owned by this process once re-exec'd
    // this way; nothing else reads stdin in bridge-child mode.
    let owned = unsafe { OwnedFd::from_raw_fd(0) };
    let std_stream = std::net::TcpStream::from(owned);
    std_stream.set_nonblocking(true)?;
    TcpStream::from_std(std_stream)
}

fn write_termcap(path: &Path, caps: TerminalCaps) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, caps.to_record())
}

/// Byte pump contract, spec §4.7: both directions run concurrently; EOF
/// or an error on either side ends the loop. IAC handling is applied only
/// when `telnet_mode` is set (Open Question decision, see DESIGN.md):
/// the TCP->UDS direction strips telnet negotiation framing and forwards
/// only data bytes; the UDS->TCP direction doubles literal `0xff` bytes
/// so a real telnet client never misreads engine output as a command.
async fn pump(tcp: TcpStream, uds: UnixStream, telnet_mode: bool) -> io::Result<()> {
    let (mut tcp_r, mut tcp_w) = tcp.into_split();
    let (mut uds_r, mut uds_w) = uds.into_split();

    let to_uds = async {
        let mut parser = Parser::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = tcp_r.read(&mut buf).await?;
            if n == 0 {
                return io::Result::Ok(());
            }
            if telnet_mode {
                for event in parser.feed(&buf[..n]) {
                    if let bbsmux_wire::NegEvent::Data(data) = event {
                        uds_w.write_all(&data).await?;
                    }
                    // Will/Wont/Do/Dont/Sb (e.g. mid-session NAWS) are
                    // consumed for protocol correctness and otherwise
                    // dropped — out of scope per spec.md's Open Question
                    // on mid-session resize.
                }
            } else {
                uds_w.write_all(&buf[..n]).await?;
            }
        }
    };

    let to_tcp = async {
        let mut buf = [0u8; 4096];
        loop {
            let n = uds_r.read(&mut buf).await?;
            if n == 0 {
                return io::Result::Ok(());
            }
            let out = if telnet_mode { iac::escape_iac(&buf[..n]) } else { buf[..n].to_vec() };
            tcp_w.write_all(&out).await?;
        }
    };

    tokio::select! {
        result = to_uds => result,
        result = to_tcp => result,
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
