use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::pty::{openpty, OpenptyResult};

const BIN: &str = env!("CARGO_BIN_EXE_combridge");

fn combridge(args: &[&str]) -> std::process::Output {
    Command::new(BIN)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .unwrap()
}

/// Collects bytes from `reader` on a background thread.
fn pump<R: Read + Send + 'static>(mut reader: R) -> Receiver<u8> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let mut buf = [0u8; 256];
        while let Ok(n) = reader.read(&mut buf) {
            if n == 0 {
                break;
            }
            for &b in &buf[..n] {
                if tx.send(b).is_err() {
                    return;
                }
            }
        }
    });
    rx
}

fn take(rx: &Receiver<u8>, count: usize) -> Vec<u8> {
    (0..count)
        .map_while(|_| rx.recv_timeout(Duration::from_secs(5)).ok())
        .collect()
}

fn read_far_end(far: &mut File, expected: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 64];
    while out.len() < expected {
        let mut fds = [PollFd::new(far.as_fd(), PollFlags::POLLIN)];
        if poll(&mut fds, PollTimeout::from(5000u16)).unwrap() == 0 {
            break;
        }
        let n = far.read(&mut buf).unwrap();
        out.extend_from_slice(&buf[..n]);
    }
    out
}

#[test]
fn test_wrong_argument_count_prints_usage() {
    let cases: [&[&str]; 5] = [
        &[],
        &["--help"],
        &["--version"],
        &["/dev/ttyS0", "9600", "N", "8"],
        &["a", "b", "c", "d", "e", "f"],
    ];
    for args in cases {
        let output = combridge(args);
        assert_eq!(output.status.code(), Some(255), "args {args:?}");
        assert!(output.stdout.is_empty());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Usage"), "{stderr}");
        assert!(stderr.contains("/dev/tty"), "{stderr}");
    }
}

#[test]
fn test_invalid_parameters_exit_without_handshake() {
    let cases = [
        (["/dev/ttyS0", "1000", "N", "8", "1"], "1000 is an invalid baud rate"),
        (["/dev/ttyS0", "9600", "X", "8", "1"], "X is an invalid parity"),
        (["/dev/ttyS0", "9600", "N", "9", "1"], "9 is an invalid number of databits"),
        (["/dev/ttyS0", "9600", "N", "8", "3"], "3 is an invalid number of stopbits"),
        (["/dev/ttyS0", "9600", "N", "8", "-1"], "-1 is an invalid number of stopbits"),
    ];
    for (args, message) in cases {
        let output = combridge(&args);
        assert_eq!(output.status.code(), Some(255));
        assert!(output.stdout.is_empty());
        assert!(String::from_utf8_lossy(&output.stderr).contains(message));
    }
}

#[test]
fn test_missing_device_fails_to_open() {
    let output = combridge(&["/dev/does-not-exist-combridge", "9600", "N", "8", "1"]);
    assert_eq!(output.status.code(), Some(255));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("couldn't open port"));
}

#[test]
fn test_bridges_a_pty_end_to_end() {
    let OpenptyResult { master, slave } = openpty(None, None).unwrap();
    let path = std::fs::read_link(format!("/proc/self/fd/{}", slave.as_raw_fd())).unwrap();
    let mut far = File::from(master);

    let mut child = Command::new(BIN)
        .arg(&path)
        .args(["9600", "N", "8", "1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .unwrap();
    drop(slave);

    let mut stdin = child.stdin.take().unwrap();
    let stdout = pump(child.stdout.take().unwrap());

    assert_eq!(take(&stdout, 1).len(), 1, "no handshake byte");

    far.write_all(b"from device").unwrap();
    assert_eq!(take(&stdout, 11), b"from device");

    stdin.write_all(b"from console").unwrap();
    stdin.flush().unwrap();
    assert_eq!(read_far_end(&mut far, 12), b"from console");

    drop(stdin);
    let status = child.wait().unwrap();
    assert!(status.success());
}

#[test]
fn test_device_hangup_is_fatal() {
    let OpenptyResult { master, slave } = openpty(None, None).unwrap();
    let path = std::fs::read_link(format!("/proc/self/fd/{}", slave.as_raw_fd())).unwrap();

    let mut child = Command::new(BIN)
        .arg(&path)
        .args(["9600", "N", "8", "1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    drop(slave);

    // Held open so console EOF cannot end the loop first.
    let _stdin = child.stdin.take().unwrap();
    let stdout = pump(child.stdout.take().unwrap());
    assert_eq!(take(&stdout, 1).len(), 1, "no handshake byte");

    drop(master);
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(255));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed in checking if the port had data ready: device hung up"),
        "{stderr}"
    );
}
