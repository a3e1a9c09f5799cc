// SPDX-License-Identifier: MIT

use super::*;
use std::os::unix::fs::PermissionsExt;
use tokio::net::{TcpListener, UnixListener};

async fn loopback_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connect = TcpStream::connect(addr);
    let (accepted, connected) = tokio::join!(listener.accept(), connect);
    (accepted.unwrap().0, connected.unwrap())
}

async fn uds_pair(dir: &std::path::Path) -> (UnixStream, UnixStream) {
    let path = dir.join("bridge-test.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let connect = UnixStream::connect(&path);
    let (accepted, connected) = tokio::join!(listener.accept(), connect);
    (accepted.unwrap().0, connected.unwrap())
}

#[tokio::test]
async fn raw_mode_pump_copies_bytes_verbatim_both_ways() {
    let dir = tempfile::tempdir().unwrap();
    let (caller_tcp, mut test_tcp) = loopback_pair().await;
    let (engine_uds, mut test_uds) = uds_pair(dir.path()).await;

    let pump_task = tokio::spawn(pump(caller_tcp, engine_uds, false));

    test_tcp.write_all(b"hello from caller").await.unwrap();
    let mut buf = [0u8; 64];
    let n = test_uds.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"hello from caller");

    test_uds.write_all(b"hello from engine").await.unwrap();
    let n = test_tcp.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"hello from engine");

    drop(test_tcp);
    drop(test_uds);
    let _ = pump_task.await;
}

#[tokio::test]
async fn telnet_mode_strips_negotiation_on_ingress_and_doubles_iac_on_egress() {
    let dir = tempfile::tempdir().unwrap();
    let (caller_tcp, mut test_tcp) = loopback_pair().await;
    let (engine_uds, mut test_uds) = uds_pair(dir.path()).await;

    let pump_task = tokio::spawn(pump(caller_tcp, engine_uds, true));

    // `IAC WILL ECHO` followed by plain data: only the data reaches the engine.
    test_tcp.write_all(&[0xff, 0xfb, 1]).await.unwrap();
    test_tcp.write_all(b"plain").await.unwrap();
    let mut buf = [0u8; 64];
    let n = test_uds.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"plain");

    // A literal 0xff from the engine is doubled for the telnet peer.
    test_uds.write_all(&[b'A', 0xff, b'B']).await.unwrap();
    let n = test_tcp.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], &[b'A', 0xff, 0xff, b'B']);

    drop(test_tcp);
    drop(test_uds);
    let _ = pump_task.await;
}

#[test]
fn spawn_bridge_hands_the_accepted_socket_to_the_childs_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("fake-bbsmuxd");
    // `spawn_bridge` always appends
    // `--bridge-node N --bridge-uds U --bridge-termcap T`, so `$6` is the
    // termcap path; the fake script hijacks it as its output file.
    std::fs::write(&script_path, "#!/bin/sh\ncat > \"$6\"\n").unwrap();
    std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let rt = tokio::runtime::Runtime::new().unwrap();
    let out_path = dir.path().join("out.txt");
    rt.block_on(async {
        let (caller_tcp, mut test_tcp) = loopback_pair().await;
        test_tcp.write_all(b"wired-through-stdin").await.unwrap();
        drop(test_tcp);

        let pid = spawn_bridge(&script_path, 1, &dir.path().join("maxipc"), &out_path, caller_tcp).unwrap();

        for _ in 0..50 {
            if out_path.exists() && std::fs::read(&out_path).unwrap() == b"wired-through-stdin" {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    });

    let contents = std::fs::read(&out_path).unwrap_or_default();
    assert_eq!(contents, b"wired-through-stdin");
}
