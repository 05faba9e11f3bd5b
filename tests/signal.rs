use assert_cmd::prelude::*;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

mod common;
use common::source_file;

fn spawn_bf(path: &std::path::Path) -> Child {
    Command::cargo_bin("bf")
        .unwrap()
        .env("BF_CONFIG", "/nonexistent/bf.toml")
        .env_remove("BF_MAX_STEPS")
        .env_remove("RUST_LOG")
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap()
}

fn sigint(child: &Child) {
    let status = Command::new("kill")
        .arg("-INT")
        .arg(child.id().to_string())
        .status()
        .expect("kill");
    assert!(status.success());
}

fn wait_with_deadline(child: &mut Child, deadline: Duration) -> ExitStatus {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if start.elapsed() > deadline {
            let _ = child.kill();
            panic!("bf did not exit after SIGINT");
        }
        sleep(Duration::from_millis(20));
    }
}

#[cfg(unix)]
#[test]
fn sigint_during_execution_exits_130() {
    let tf = source_file(b"+[]");
    let mut child = spawn_bf(tf.path());

    // Give the interpreter time to install its handler and enter the loop.
    sleep(Duration::from_millis(500));
    sigint(&child);

    let status = wait_with_deadline(&mut child, Duration::from_secs(5));
    assert_eq!(status.code(), Some(130));

    let mut stderr = String::new();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();
    assert!(stderr.contains("Runtime error: execution aborted, interrupted"), "stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn sigint_keeps_output_written_before_the_interrupt() {
    let tf = source_file(b"++++++++[>++++++++<-]>+.[]");
    let mut child = spawn_bf(tf.path());

    sleep(Duration::from_millis(500));
    sigint(&child);

    let status = wait_with_deadline(&mut child, Duration::from_secs(5));
    assert_eq!(status.code(), Some(130));

    let mut stdout = Vec::new();
    child.stdout.take().unwrap().read_to_end(&mut stdout).unwrap();
    assert_eq!(stdout, b"A");
}
