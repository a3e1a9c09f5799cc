// SPDX-License-Identifier: MIT

use super::*;
use std::os::fd::{AsRawFd, IntoRawFd};
use std::time::{Duration, Instant};

fn wait_for_exit(pid: u32) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let status = nix::sys::wait::waitpid(
            nix::unistd::Pid::from_raw(pid as i32),
            Some(nix::sys::wait::WaitPidFlag::WNOHANG),
        );
        if !matches!(status, Ok(nix::sys::wait::WaitStatus::StillAlive)) {
            return;
        }
        if Instant::now() > deadline {
            panic!("editor child did not exit in time");
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn editor_inherits_the_stand_in_tty_fds_and_restore_gives_them_back() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("max.prm");
    std::fs::write(&config_path, b"; placeholder\n").unwrap();

    // Stand in for the real fds 1/2 with a pipe pair per side, so the
    // test's own stdout/stderr are never touched.
    let (out_r, out_w) = nix::unistd::pipe().unwrap();
    let (err_r, err_w) = nix::unistd::pipe().unwrap();
    let stand_in_out = out_w.into_raw_fd();
    let stand_in_err = err_w.into_raw_fd();

    let handoff =
        launch_on_fds(Path::new("/bin/echo"), dir.path(), &config_path, stand_in_out, stand_in_err).unwrap();

    wait_for_exit(handoff.pid);

    // While the editor "holds" the stand-in fds, the monitor's copy has
    // been redirected to /dev/null; restore must give them back to the
    // original pipe-write ends without error.
    restore(handoff).unwrap();

    drop(out_r);
    drop(err_r);
    unsafe {
        libc::close(stand_in_out);
        libc::close(stand_in_err);
    }
}

#[test]
fn editor_sees_the_worker_style_environment() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("max.prm");
    std::fs::write(&config_path, b"; placeholder\n").unwrap();
    let out_path = dir.path().join("env.out");

    let (out_w, _out_w_raw) = nix::unistd::pipe().unwrap();
    let (err_w, _err_w_raw) = nix::unistd::pipe().unwrap();

    let script = dir.path().join("fake_maxcfg.sh");
    std::fs::write(&script, format!("#!/bin/sh\nenv > {}\n", out_path.display())).unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
    std::fs::set_permissions(&script, perms).unwrap();

    let handoff = launch_on_fds(&script, dir.path(), &config_path, out_w.as_raw_fd(), err_w.as_raw_fd()).unwrap();
    wait_for_exit(handoff.pid);
    restore(handoff).unwrap();

    let seen = std::fs::read_to_string(&out_path).unwrap();
    assert!(seen.contains("MAXIMUS="), "editor env missing MAXIMUS: {seen}");
    assert!(seen.contains("MAX_INSTALL_PATH="), "editor env missing MAX_INSTALL_PATH: {seen}");
}
