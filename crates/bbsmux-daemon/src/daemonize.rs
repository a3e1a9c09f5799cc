// SPDX-License-Identifier: MIT

//! `-D` daemonize, per spec §6: "double-fork, `setsid`, stdio ->
//! `/dev/null`; parent exits 0 printing the child pid."
//!
//! Grounded in `proxmox-rs`'s `daemon.rs` double-fork handshake: a pipe
//! carries the final pid back up to the original process rather than the
//! caller racing to read it off `/proc` or a pidfile. The legacy
//! `maxtel.c` only does a single `fork`+`setsid`; spec.md's prose asks
//! for the stricter double-fork (immune to re-acquiring a controlling
//! terminal), which is what's implemented here — recorded as a deliberate
//! deviation in DESIGN.md, not an oversight.

use crate::error::DaemonError;
use nix::unistd::{fork, setsid, ForkResult};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd};

/// Daemonize the current process.
///
/// In the original process and the short-lived intermediate child, this
/// never returns: the original process prints the daemon's pid to stdout
/// and calls `std::process::exit(0)`; the intermediate child exits
/// silently. Only the final grandchild — the daemon itself — returns
/// `Ok(())`, with stdin/stdout/stderr already redirected to `/dev/null`.
pub fn daemonize() -> Result<(), DaemonError> {
    inner_daemonize().map_err(|error| DaemonError::Daemonize(error.to_string()))
}

fn inner_daemonize() -> io::Result<()> {
    let (read_fd, write_fd) = nix::unistd::pipe().map_err(nix_to_io)?;

    // SAFETY: single-threaded at startup, before any tokio runtime exists.
    match unsafe { fork() }.map_err(nix_to_io)? {
        ForkResult::Parent { .. } => {
            drop(write_fd);
            let mut reader = File::from(read_fd);
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            println!("{}", u32::from_ne_bytes(buf));
            std::process::exit(0);
        }
        ForkResult::Child => {
            drop(read_fd);
            setsid().map_err(nix_to_io)?;

            // SAFETY: see above.
            match unsafe { fork() }.map_err(nix_to_io)? {
                ForkResult::Parent { .. } => {
                    // Exit immediately: an intermediate child that already
                    // called `setsid` can never reacquire a controlling
                    // terminal, which is the whole point of double-forking.
                    std::process::exit(0);
                }
                ForkResult::Child => {
                    let pid = std::process::id();
                    let mut writer = File::from(write_fd);
                    writer.write_all(&pid.to_ne_bytes())?;
                    drop(writer);

                    redirect_stdio_to_dev_null()?;
                    Ok(())
                }
            }
        }
    }
}

fn redirect_stdio_to_dev_null() -> io::Result<()> {
    let dev_null = std::fs::OpenOptions::new().read(true).write(true).open("/dev/null")?;
    let raw = dev_null.as_raw_fd();
    for target in [0, 1, 2] {
        nix::unistd::dup2(raw, target).map_err(nix_to_io)?;
    }
    // `dev_null` itself may now close; the dup'd fds keep the file open.
    drop(dev_null);
    Ok(())
}

fn nix_to_io(e: nix::Error) -> io::Error {
    io::Error::from_raw_os_error(e as i32)
}
